use thiserror::Error;

/// Phases a match moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Nothing started yet.
    Init,
    /// Decorative roulette before the track starts.
    Choosing,
    /// Track playing, votes accepted.
    Voting,
    /// Suspense before the answer; no votes.
    PreReveal,
    /// Answer shown, scores applied.
    Reveal,
    /// Passive wait before the next round or the finale.
    Intermission,
    /// Champion podium; only a host skip leaves it.
    GameOver,
    /// No playable track; absorbing.
    Error,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A track was picked for a new round (first round, next round, skip or reset).
    RoundStarted,
    /// The choosing roulette ran its course.
    ChoosingElapsed,
    /// Every player voted or the voting timeout elapsed.
    VotingClosed,
    /// The pre-reveal suspense ran its course.
    SuspenseElapsed,
    /// The last round is over, either run to the end or skipped by the host.
    MatchFinished,
    /// The reveal highlight ran its course.
    RevealFinished,
    /// No playable track could be found.
    NoTracks,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Closed transition table with a version bumped on every applied transition.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Init,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine in the init phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Apply `event`, returning the new phase.
    pub fn fire(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        use GameEvent as E;
        use GamePhase as P;

        let next = match (self.phase, event) {
            (P::Error, _) => return Err(InvalidTransition { from: P::Error, event }),
            (_, E::RoundStarted) => P::Choosing,
            (_, E::NoTracks) => P::Error,
            (P::Choosing, E::ChoosingElapsed) => P::Voting,
            (P::Voting, E::VotingClosed) => P::PreReveal,
            (P::PreReveal, E::SuspenseElapsed) => P::Reveal,
            (P::Reveal, E::RevealFinished) => P::Intermission,
            (
                P::Choosing | P::Voting | P::PreReveal | P::Reveal | P::Intermission,
                E::MatchFinished,
            ) => P::GameOver,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
