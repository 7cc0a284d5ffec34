//! Single-writer task owning the match: drains inputs, advances time, fans out changes.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        common::{GameSnapshot, PlayerSnapshot},
        sse::{RoundRevealedEvent, VoteLockedEvent},
        ws::ControllerCommand,
    },
    services::controller_service::ControllerFeedback,
    state::{
        SseHub,
        game::{HostAction, InputEvent},
        session::GameSession,
        state_machine::GamePhase,
    },
};

const EVENT_GAME_SNAPSHOT: &str = "game.snapshot";
const EVENT_VOTE_LOCKED: &str = "vote.locked";
const EVENT_ROUND_REVEALED: &str = "round.revealed";

/// Receiving ends of the input channels, drained in this order every tick.
pub struct LoopInputs {
    /// Keyboard and admin HTTP.
    pub console: mpsc::UnboundedReceiver<InputEvent>,
    /// Hardware controllers, when enabled.
    pub controllers: Option<mpsc::UnboundedReceiver<InputEvent>>,
}

/// Whether the loop should keep going after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,
    /// The host asked to quit.
    Quit,
}

/// The host loop.
pub struct GameLoop {
    session: GameSession,
    inputs: LoopInputs,
    feedback: Arc<dyn ControllerFeedback>,
    public: SseHub,
    snapshot: watch::Sender<GameSnapshot>,
    shutdown: Arc<watch::Sender<bool>>,
    last_version: usize,
    last_revision: u64,
    last_worth: Option<i32>,
}

impl GameLoop {
    /// Wrap a session. Returns the loop and a receiver always holding the latest snapshot.
    pub fn new(
        session: GameSession,
        inputs: LoopInputs,
        feedback: Arc<dyn ControllerFeedback>,
        public: SseHub,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> (Self, watch::Receiver<GameSnapshot>) {
        let initial = GameSnapshot::capture(&session, Duration::ZERO);
        let (snapshot, snapshot_rx) = watch::channel(initial);
        let game_loop = Self {
            last_version: session.phase_version(),
            last_revision: session.revision(),
            last_worth: None,
            session,
            inputs,
            feedback,
            public,
            snapshot,
            shutdown,
        };
        (game_loop, snapshot_rx)
    }

    /// The match, read-only.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Run one tick at wall-clock `now`.
    pub fn tick(&mut self, now: Duration) -> TickOutcome {
        while let Ok(event) = self.inputs.console.try_recv() {
            if self.apply(event, now) == TickOutcome::Quit {
                return TickOutcome::Quit;
            }
        }
        if let Some(controllers) = self.inputs.controllers.as_mut() {
            let mut pending = Vec::new();
            while let Ok(event) = controllers.try_recv() {
                pending.push(event);
            }
            for event in pending {
                if self.apply(event, now) == TickOutcome::Quit {
                    return TickOutcome::Quit;
                }
            }
        }

        self.session.update(now);

        let version = self.session.phase_version();
        if version != self.last_version {
            self.last_version = version;
            self.on_phase_changed();
        }

        let worth = self.session.current_speed_points(now);
        if self.session.revision() != self.last_revision || worth != self.last_worth {
            self.last_revision = self.session.revision();
            self.last_worth = worth;
            let snapshot = GameSnapshot::capture(&self.session, now);
            self.public.publish(EVENT_GAME_SNAPSHOT, &snapshot);
            self.snapshot.send_replace(snapshot);
        }

        TickOutcome::Continue
    }

    /// Tick at `interval` until quit or an external shutdown, then raise the shutdown flag.
    pub async fn run(mut self, interval: Duration) {
        let origin = Instant::now();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown = self.shutdown.subscribe();
        info!(tick_ms = interval.as_millis() as u64, "game loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.tick(origin.elapsed()) == TickOutcome::Quit {
                        info!("quit requested");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.session.stop_audio();
        self.shutdown.send_replace(true);
        info!("game loop stopped");
    }

    fn apply(&mut self, event: InputEvent, now: Duration) -> TickOutcome {
        match event {
            InputEvent::Vote(vote) => {
                if self
                    .session
                    .register_vote(vote.player_index, vote.choice, now)
                {
                    let player = self.session.players()[vote.player_index].name.clone();
                    self.public.publish(
                        EVENT_VOTE_LOCKED,
                        &VoteLockedEvent {
                            player_index: vote.player_index,
                            player,
                        },
                    );
                }
            }
            InputEvent::Host(HostAction::Pause) => self.session.toggle_pause(now),
            InputEvent::Host(HostAction::Skip) => self.session.skip_round(now),
            InputEvent::Host(HostAction::Quit) => return TickOutcome::Quit,
        }
        TickOutcome::Continue
    }

    fn on_phase_changed(&self) {
        let phase = self.session.phase();
        debug!(?phase, "broadcasting phase change");
        match phase {
            GamePhase::Voting => self.feedback.send_all(ControllerCommand::Reset),
            GamePhase::Reveal => {
                let Some(track) = self.session.current_track() else {
                    warn!("reveal without a track; skipping reveal broadcast");
                    return;
                };
                self.feedback
                    .send_all(ControllerCommand::win(track.category));
                self.public.publish(
                    EVENT_ROUND_REVEALED,
                    &RoundRevealedEvent {
                        round_index: self.session.round_index(),
                        correct: track.category,
                        players: self
                            .session
                            .players()
                            .iter()
                            .map(|p| PlayerSnapshot::from_player(p, true))
                            .collect(),
                    },
                );
            }
            _ => {}
        }
    }
}
