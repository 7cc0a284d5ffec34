//! The match aggregate: round progression, vote intake, scoring at reveal, pause bookkeeping
//! and champion selection. Owned by a single task; every operation is synchronous.

use std::{collections::HashSet, path::PathBuf, time::Duration};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::GameSettings,
    dao::{
        models::{PlayerRoundRecord, RoundRecord},
        round_log::RoundLogger,
        songs::SongSelector,
    },
    services::audio_service::{AudioSink, Cue},
    state::{
        clock::PauseClock,
        game::{Category, LockedVote, Player, ScoreAnimation, Track},
        state_machine::{GameEvent, GamePhase, GameStateMachine},
    },
};

/// Shown when both song folders are empty.
pub const NO_SONGS_MESSAGE: &str = "No songs found. Add files to songs/ai and songs/human.";
/// Shown when every candidate track turned out to be unplayable.
pub const NO_PLAYABLE_SONGS_MESSAGE: &str = "Failed to load any songs. Check audio file support.";

/// Wall-clock bounds of the current timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseWindow {
    /// When the phase started.
    pub started_at: Duration,
    /// When the phase ends on its own, if it does.
    pub deadline: Option<Duration>,
}

/// The match and its collaborators.
pub struct GameSession {
    settings: GameSettings,
    songs: Box<dyn SongSelector>,
    audio: Box<dyn AudioSink>,
    logger: Box<dyn RoundLogger>,
    machine: GameStateMachine,
    clock: PauseClock,
    match_id: Uuid,
    players: Vec<Player>,
    round_index: u32,
    current_track: Option<Track>,
    error_message: Option<String>,
    // Phase boundaries, all in effective time.
    choosing_started_at: Duration,
    voting_open_time: Duration,
    pre_reveal_started_at: Duration,
    reveal_started_at: Duration,
    reveal_end_time: Duration,
    intermission_end_time: Duration,
    game_over_started_at: Option<Duration>,
    next_tick_at: Duration,
    revision: u64,
}

impl GameSession {
    /// Create a match in the init phase. Nothing happens until the first [`update`](Self::update).
    pub fn new(
        settings: GameSettings,
        songs: Box<dyn SongSelector>,
        audio: Box<dyn AudioSink>,
        logger: Box<dyn RoundLogger>,
    ) -> Self {
        let players = settings
            .player_names
            .iter()
            .enumerate()
            .map(|(index, name)| Player::new(index, name.clone()))
            .collect();

        Self {
            settings,
            songs,
            audio,
            logger,
            machine: GameStateMachine::new(),
            clock: PauseClock::default(),
            match_id: Uuid::new_v4(),
            players,
            round_index: 0,
            current_track: None,
            error_message: None,
            choosing_started_at: Duration::ZERO,
            voting_open_time: Duration::ZERO,
            pre_reveal_started_at: Duration::ZERO,
            reveal_started_at: Duration::ZERO,
            reveal_end_time: Duration::ZERO,
            intermission_end_time: Duration::ZERO,
            game_over_started_at: None,
            next_tick_at: Duration::ZERO,
            revision: 0,
        }
    }

    /// Rename players in index order. Blank entries are skipped and extra names are dropped.
    pub fn set_player_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned = names
            .into_iter()
            .filter_map(|name| {
                let trimmed = name.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });
        for (player, name) in self.players.iter_mut().zip(cleaned) {
            player.name = name;
        }
        self.revision += 1;
    }

    /// Advance time-based transitions. At most one transition fires per call.
    pub fn update(&mut self, now: Duration) {
        let phase = self.machine.phase();
        if phase == GamePhase::Error || self.clock.is_paused() {
            return;
        }

        let t = self.clock.effective(now);
        let timings = &self.settings.timings;
        match phase {
            GamePhase::Init => self.start_round(now),
            GamePhase::Choosing => {
                if t >= self.choosing_started_at + timings.choosing {
                    self.open_voting(t);
                } else {
                    self.roulette_tick(t);
                }
            }
            GamePhase::Voting => {
                let all_voted = self.players.iter().all(Player::has_voted);
                if all_voted || t >= self.voting_open_time + timings.voting_timeout {
                    self.close_voting(t, all_voted);
                }
            }
            GamePhase::PreReveal => {
                if t >= self.pre_reveal_started_at + timings.pre_reveal {
                    self.perform_reveal(t);
                }
            }
            GamePhase::Reveal => {
                if t >= self.reveal_end_time {
                    self.intermission_end_time = t + timings.intermission;
                    self.advance(GameEvent::RevealFinished);
                }
            }
            GamePhase::Intermission => {
                if t >= self.intermission_end_time {
                    if self.is_last_round() {
                        self.finish_match(t);
                    } else {
                        self.start_round(now);
                    }
                }
            }
            GamePhase::GameOver | GamePhase::Error => {}
        }
    }

    /// Lock in a vote. Returns whether it was accepted; every rejection is a silent no-op.
    pub fn register_vote(&mut self, player_index: usize, choice: Category, now: Duration) -> bool {
        if self.machine.phase() != GamePhase::Voting || self.clock.is_paused() {
            debug!(player_index, ?choice, "vote ignored outside the voting window");
            return false;
        }
        let at = self.clock.effective(now);
        let Some(player) = self.players.get_mut(player_index) else {
            debug!(player_index, "vote ignored: unknown player");
            return false;
        };
        if player.has_voted() {
            debug!(player_index, "vote ignored: already locked in");
            return false;
        }

        player.vote = Some(LockedVote { choice, at });
        info!(
            player = %player.name,
            %choice,
            reaction_ms = at.saturating_sub(self.voting_open_time).as_millis() as u64,
            "vote locked"
        );
        self.audio.play_cue(Cue::LockIn);
        self.revision += 1;
        true
    }

    /// Toggle the pause. Ignored in the error phase and while votes are open.
    pub fn toggle_pause(&mut self, now: Duration) {
        match self.machine.phase() {
            GamePhase::Error | GamePhase::Voting => {
                debug!(phase = ?self.machine.phase(), "pause ignored in this phase");
                return;
            }
            _ => {}
        }

        if let Some(paused_for) = self.clock.resume(now) {
            info!(paused_ms = paused_for.as_millis() as u64, "game resumed");
            self.audio.resume_music();
        } else {
            self.clock.pause(now);
            info!("game paused");
            self.audio.pause_music();
        }
        self.revision += 1;
    }

    /// End the current round now and start the next one; on the podium, reset the match first.
    ///
    /// Skipping the last round of a limited match goes straight to the podium.
    /// The pause state is left untouched.
    pub fn skip_round(&mut self, now: Duration) {
        let phase = self.machine.phase();
        match phase {
            GamePhase::Error => {
                debug!("skip ignored in the error phase");
                return;
            }
            GamePhase::GameOver => self.reset_match(),
            _ => {
                info!(round = self.round_index, "round skipped");
                self.audio.stop_music();
                if self.is_last_round() {
                    // An unrevealed round is dropped so the podium does not show its answer.
                    if matches!(
                        phase,
                        GamePhase::Choosing | GamePhase::Voting | GamePhase::PreReveal
                    ) {
                        self.current_track = None;
                        for player in &mut self.players {
                            player.reset_round();
                        }
                    }
                    self.finish_match(self.clock.effective(now));
                    return;
                }
            }
        }
        self.start_round(now);
    }

    /// Points a correct vote locked in at `now` would earn, while voting is open.
    pub fn current_speed_points(&self, now: Duration) -> Option<i32> {
        (self.machine.phase() == GamePhase::Voting).then(|| self.speed_points_at(now))
    }

    /// Points a correct vote locked in at `now` would earn against the current voting window.
    pub fn speed_points_at(&self, now: Duration) -> i32 {
        let elapsed = self
            .clock
            .effective(now)
            .saturating_sub(self.voting_open_time);
        self.settings
            .scoring
            .speed_points(elapsed, self.settings.timings.voting_timeout)
    }

    /// Wall-clock window of the current phase, given the pauses completed so far.
    pub fn phase_window(&self) -> Option<PhaseWindow> {
        let (started_at, deadline) = self.effective_window()?;
        Some(PhaseWindow {
            started_at: self.clock.to_wall(started_at),
            deadline: deadline.map(|d| self.clock.to_wall(d)),
        })
    }

    /// Time left before the current phase ends on its own.
    pub fn phase_remaining(&self, now: Duration) -> Option<Duration> {
        let (_, deadline) = self.effective_window()?;
        deadline.map(|d| d.saturating_sub(self.clock.effective(now)))
    }

    /// Effective time for a wall-clock reading.
    pub fn effective_now(&self, now: Duration) -> Duration {
        self.clock.effective(now)
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Number of phase transitions applied since startup.
    pub fn phase_version(&self) -> usize {
        self.machine.version()
    }

    /// Counter bumped on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Players in index order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// 1-based index of the current round; zero before the first round.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    /// Configured rounds per match; zero or less means unlimited.
    pub fn total_rounds(&self) -> i32 {
        self.settings.total_rounds
    }

    /// Track of the current round.
    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// User-facing message, set only in the error phase.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether effective time is frozen.
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Identifier of the running match.
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Effective time the voting window opened.
    pub fn voting_open_time(&self) -> Duration {
        self.voting_open_time
    }

    /// Effective time the podium appeared.
    pub fn game_over_started_at(&self) -> Option<Duration> {
        self.game_over_started_at
    }

    /// Stop the music before shutting down.
    pub fn stop_audio(&self) {
        self.audio.stop_music();
    }

    fn effective_window(&self) -> Option<(Duration, Option<Duration>)> {
        let timings = &self.settings.timings;
        let window = match self.machine.phase() {
            GamePhase::Choosing => (
                self.choosing_started_at,
                Some(self.choosing_started_at + timings.choosing),
            ),
            GamePhase::Voting => (
                self.voting_open_time,
                Some(self.voting_open_time + timings.voting_timeout),
            ),
            GamePhase::PreReveal => (
                self.pre_reveal_started_at,
                Some(self.pre_reveal_started_at + timings.pre_reveal),
            ),
            GamePhase::Reveal => (self.reveal_started_at, Some(self.reveal_end_time)),
            GamePhase::Intermission => (
                self.intermission_end_time.saturating_sub(timings.intermission),
                Some(self.intermission_end_time),
            ),
            GamePhase::GameOver => (self.game_over_started_at?, None),
            GamePhase::Init | GamePhase::Error => return None,
        };
        Some(window)
    }

    fn is_last_round(&self) -> bool {
        self.settings.total_rounds > 0
            && i64::from(self.round_index) >= i64::from(self.settings.total_rounds)
    }

    fn start_round(&mut self, now: Duration) {
        if !self.songs.has_any() {
            self.fail(NO_SONGS_MESSAGE);
            return;
        }

        let mut unplayable: HashSet<PathBuf> = HashSet::new();
        let track = loop {
            let Some(track) = self.songs.pick(&unplayable) else {
                self.fail(NO_PLAYABLE_SONGS_MESSAGE);
                return;
            };
            if self.songs.is_playable(&track) {
                break track;
            }
            warn!(path = %track.path.display(), "track is not playable; picking another one");
            unplayable.insert(track.path);
        };

        for player in &mut self.players {
            player.reset_round();
        }
        let t = self.clock.effective(now);
        self.round_index += 1;
        self.choosing_started_at = t;
        self.next_tick_at = t;
        info!(
            round = self.round_index,
            path = %track.path.display(),
            "round started"
        );
        self.current_track = Some(track);
        self.advance(GameEvent::RoundStarted);
    }

    fn roulette_tick(&mut self, t: Duration) {
        if t < self.next_tick_at {
            return;
        }
        self.audio.play_cue(Cue::Tick);

        let timings = &self.settings.timings;
        let progress = if timings.choosing.is_zero() {
            1.0
        } else {
            (t.saturating_sub(self.choosing_started_at).as_secs_f64()
                / timings.choosing.as_secs_f64())
            .clamp(0.0, 1.0)
        };
        let start = timings.tick_interval_start.as_secs_f64();
        let end = timings.tick_interval_end.as_secs_f64();
        let interval = (start + (end - start) * progress * progress).max(0.0);
        self.next_tick_at = t + Duration::from_secs_f64(interval);
    }

    fn open_voting(&mut self, t: Duration) {
        if !self.advance(GameEvent::ChoosingElapsed) {
            return;
        }
        self.voting_open_time = t;
        if let Some(track) = &self.current_track {
            if !self.audio.play_music(&track.path) {
                warn!(path = %track.path.display(), "music playback failed; voting continues");
            }
        }
        self.audio.play_cue(Cue::Start);
    }

    fn close_voting(&mut self, t: Duration, all_voted: bool) {
        if !self.advance(GameEvent::VotingClosed) {
            return;
        }
        debug!(all_voted, "voting closed");
        self.pre_reveal_started_at = t;
        self.audio.stop_music();
        self.audio.play_cue(Cue::Drumroll);
    }

    fn perform_reveal(&mut self, t: Duration) {
        if !self.advance(GameEvent::SuspenseElapsed) {
            return;
        }
        self.reveal_started_at = t;
        self.reveal_end_time = t + self.settings.timings.reveal;

        let Some(track) = self.current_track.clone() else {
            warn!("reveal without a current track; scores left untouched");
            return;
        };
        let correct = track.category;
        let timeout = self.settings.timings.voting_timeout;
        for player in &mut self.players {
            let delta =
                self.settings
                    .scoring
                    .round_delta(player.vote, correct, self.voting_open_time, timeout);
            player.points_delta = delta;
            player.is_winner = player.choice() == Some(correct);
            if delta != 0 {
                let from = player.display_score;
                player.score += delta;
                player.score_animation = Some(ScoreAnimation {
                    start: t,
                    from,
                    to: f64::from(player.score),
                });
            }
        }

        self.audio.play_cue(Cue::Reveal);
        if self.players.iter().any(|p| p.is_winner) {
            self.audio.play_cue(Cue::Win);
        } else {
            self.audio.play_cue(Cue::Lose);
        }
        info!(round = self.round_index, %correct, "round revealed");

        let record = self.round_record(&track);
        if let Err(err) = self.logger.log_round(&record) {
            warn!(error = %err, round = self.round_index, "failed to log round");
        }
    }

    fn round_record(&self, track: &Track) -> RoundRecord {
        RoundRecord {
            match_id: self.match_id,
            round_index: self.round_index,
            track_path: track.path.display().to_string(),
            category: track.category.log_label(),
            correct_answer: track.category,
            players: self
                .players
                .iter()
                .map(|player| PlayerRoundRecord {
                    name: player.name.clone(),
                    vote: player.choice(),
                    reaction_time: player.vote.map(|vote| {
                        vote.at.saturating_sub(self.voting_open_time).as_secs_f64()
                    }),
                    correct: player.is_winner,
                    points_delta: player.points_delta,
                    score_after: player.score,
                })
                .collect(),
        }
    }

    fn finish_match(&mut self, t: Duration) {
        if !self.advance(GameEvent::MatchFinished) {
            return;
        }
        if let Some(top) = self.players.iter().map(|p| p.score).max() {
            for player in &mut self.players {
                player.is_champion = player.score == top;
            }
        }
        self.game_over_started_at = Some(t);
        let champions: Vec<&str> = self
            .players
            .iter()
            .filter(|p| p.is_champion)
            .map(|p| p.name.as_str())
            .collect();
        info!(?champions, rounds = self.round_index, "match finished");
        self.audio.play_cue(Cue::Triumph);
    }

    fn reset_match(&mut self) {
        for player in &mut self.players {
            player.reset_match();
        }
        self.round_index = 0;
        self.current_track = None;
        self.game_over_started_at = None;
        self.match_id = Uuid::new_v4();
        info!(match_id = %self.match_id, "match reset");
    }

    fn fail(&mut self, message: &str) {
        warn!(reason = message, "no playable track; halting");
        self.audio.stop_music();
        self.current_track = None;
        self.error_message = Some(message.to_string());
        self.advance(GameEvent::NoTracks);
    }

    fn advance(&mut self, event: GameEvent) -> bool {
        match self.machine.fire(event) {
            Ok(phase) => {
                debug!(?event, ?phase, "phase changed");
                self.revision += 1;
                true
            }
            Err(err) => {
                warn!(error = %err, "phase transition rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        config::PhaseTimings,
        dao::storage::{StorageError, StorageResult},
        state::scoring::ScoringRules,
    };

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    struct FakeSongs {
        tracks: Vec<Track>,
        unplayable: HashSet<PathBuf>,
    }

    impl SongSelector for FakeSongs {
        fn pick(&mut self, excluding: &HashSet<PathBuf>) -> Option<Track> {
            self.tracks
                .iter()
                .find(|t| !excluding.contains(&t.path))
                .cloned()
        }

        fn has_any(&self) -> bool {
            !self.tracks.is_empty()
        }

        fn is_playable(&self, track: &Track) -> bool {
            !self.unplayable.contains(&track.path)
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        music_fails: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AudioSink for Recorder {
        fn play_music(&self, path: &std::path::Path) -> bool {
            self.push(format!("play {}", path.display()));
            !self.music_fails
        }

        fn stop_music(&self) {
            self.push("stop".into());
        }

        fn pause_music(&self) {
            self.push("pause".into());
        }

        fn resume_music(&self) {
            self.push("resume".into());
        }

        fn play_cue(&self, cue: Cue) {
            self.push(format!("cue {cue:?}"));
        }
    }

    #[derive(Clone, Default)]
    struct Log {
        records: Arc<Mutex<Vec<RoundRecord>>>,
        fails: bool,
    }

    impl RoundLogger for Log {
        fn log_round(&self, record: &RoundRecord) -> StorageResult<()> {
            if self.fails {
                return Err(StorageError::io(
                    "logs/game_log.jsonl",
                    "appending round",
                    std::io::Error::other("disk full"),
                ));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn settings(total_rounds: i32) -> GameSettings {
        GameSettings {
            timings: PhaseTimings::default(),
            scoring: ScoringRules::default(),
            total_rounds,
            player_names: vec!["P1".into(), "P2".into(), "P3".into()],
        }
    }

    fn tracks(category: Category) -> Vec<Track> {
        vec![Track::new("songs/one.mp3", category)]
    }

    fn session_with(
        total_rounds: i32,
        tracks: Vec<Track>,
        audio: Recorder,
        log: Log,
    ) -> GameSession {
        GameSession::new(
            settings(total_rounds),
            Box::new(FakeSongs {
                tracks,
                unplayable: HashSet::new(),
            }),
            Box::new(audio),
            Box::new(log),
        )
    }

    fn session(total_rounds: i32) -> GameSession {
        session_with(
            total_rounds,
            tracks(Category::Silicon),
            Recorder::default(),
            Log::default(),
        )
    }

    /// Drives a session from a fresh round at `start` into the voting phase.
    fn into_voting(game: &mut GameSession, start: f64) -> f64 {
        game.update(secs(start));
        assert_eq!(game.phase(), GamePhase::Choosing);
        game.update(secs(start + 3.0));
        assert_eq!(game.phase(), GamePhase::Voting);
        start + 3.0
    }

    #[test]
    fn single_voter_round_walks_every_phase() {
        let log = Log::default();
        let mut game = session_with(6, tracks(Category::Silicon), Recorder::default(), log.clone());

        let open = into_voting(&mut game, 0.0);
        assert_eq!(game.round_index(), 1);
        assert!(game.register_vote(0, Category::Silicon, secs(open + 2.0)));

        game.update(secs(open + 14.9));
        assert_eq!(game.phase(), GamePhase::Voting);
        game.update(secs(open + 15.0));
        assert_eq!(game.phase(), GamePhase::PreReveal);
        game.update(secs(open + 18.0));
        assert_eq!(game.phase(), GamePhase::Reveal);

        let players = game.players();
        assert_eq!(players[0].points_delta, 2);
        assert!(players[0].is_winner);
        assert_eq!(players[0].score, 2);
        assert_eq!(players[1].points_delta, 0);
        assert_eq!(players[2].points_delta, 0);

        game.update(secs(open + 22.0));
        assert_eq!(game.phase(), GamePhase::Intermission);
        game.update(secs(open + 24.0));
        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 2);
        assert!(!game.players()[0].has_voted());
        assert_eq!(game.players()[0].score, 2);

        let records = log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].players[0].reaction_time, Some(2.0));
        assert_eq!(records[0].players[1].vote, None);
        assert_eq!(records[0].players[1].reaction_time, None);
    }

    #[test]
    fn wrong_vote_costs_the_penalty() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        game.register_vote(1, Category::Soul, secs(open + 1.0));
        game.update(secs(open + 15.0));
        game.update(secs(open + 18.0));

        assert_eq!(game.players()[1].points_delta, -1);
        assert_eq!(game.players()[1].score, -1);
        assert!(!game.players()[1].is_winner);
    }

    #[test]
    fn all_votes_close_voting_early() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        for index in 0..3 {
            assert!(game.register_vote(index, Category::Soul, secs(open + 1.0)));
        }
        game.update(secs(open + 1.0));
        assert_eq!(game.phase(), GamePhase::PreReveal);
    }

    #[test]
    fn second_vote_does_not_overwrite_the_first() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        assert!(game.register_vote(0, Category::Silicon, secs(open + 1.0)));
        assert!(!game.register_vote(0, Category::Soul, secs(open + 2.0)));

        let vote = game.players()[0].vote.unwrap();
        assert_eq!(vote.choice, Category::Silicon);
        assert_eq!(vote.at, secs(open + 1.0));
    }

    #[test]
    fn votes_outside_voting_or_out_of_range_are_ignored() {
        let mut game = session(6);
        assert!(!game.register_vote(0, Category::Silicon, Duration::ZERO));
        game.update(Duration::ZERO);
        assert!(!game.register_vote(0, Category::Silicon, secs(1.0)));

        let open = into_voting(&mut game, 0.0);
        let revision = game.revision();
        assert!(!game.register_vote(7, Category::Silicon, secs(open)));
        assert_eq!(game.revision(), revision);
    }

    #[test]
    fn pause_is_refused_while_voting() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        game.toggle_pause(secs(open + 1.0));
        assert!(!game.is_paused());
    }

    #[test]
    fn pause_shifts_boundaries_by_the_paused_span() {
        let audio = Recorder::default();
        let mut game = session_with(6, tracks(Category::Silicon), audio.clone(), Log::default());
        game.update(Duration::ZERO);
        let before = game.phase_window().unwrap();
        assert_eq!(before.deadline, Some(secs(3.0)));

        game.toggle_pause(secs(1.0));
        assert!(game.is_paused());
        let effective_before = game.effective_now(secs(1.0));
        game.update(secs(5.0));
        assert_eq!(game.phase(), GamePhase::Choosing);

        game.toggle_pause(secs(11.0));
        assert!(!game.is_paused());
        assert_eq!(game.effective_now(secs(11.0)), effective_before);

        let after = game.phase_window().unwrap();
        assert_eq!(after.started_at, before.started_at + secs(10.0));
        assert_eq!(after.deadline, Some(secs(13.0)));

        game.update(secs(12.9));
        assert_eq!(game.phase(), GamePhase::Choosing);
        game.update(secs(13.0));
        assert_eq!(game.phase(), GamePhase::Voting);

        let calls = audio.calls();
        assert!(calls.contains(&"pause".to_string()));
        assert!(calls.contains(&"resume".to_string()));
    }

    #[test]
    fn skip_during_voting_starts_the_next_round() {
        let audio = Recorder::default();
        let mut game = session_with(6, tracks(Category::Soul), audio.clone(), Log::default());
        let open = into_voting(&mut game, 0.0);
        game.register_vote(2, Category::Soul, secs(open + 1.0));

        game.skip_round(secs(open + 2.0));

        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 2);
        assert!(game.players().iter().all(|p| !p.has_voted()));
        assert_eq!(game.players()[2].score, 0);
        assert!(audio.calls().contains(&"stop".to_string()));
    }

    #[test]
    fn match_ends_with_champions_and_skip_resets_it() {
        let audio = Recorder::default();
        let mut game = session_with(2, tracks(Category::Silicon), audio.clone(), Log::default());
        let first_match = game.match_id();

        let mut start = 0.0;
        for round in 1..=2 {
            let open = into_voting(&mut game, start);
            // P1 and P2 answer identically each round, P3 stays silent.
            game.register_vote(0, Category::Silicon, secs(open));
            game.register_vote(1, Category::Silicon, secs(open));
            game.update(secs(open + 15.0));
            game.update(secs(open + 18.0));
            game.update(secs(open + 22.0));
            assert_eq!(game.phase(), GamePhase::Intermission, "round {round}");
            start = open + 24.0;
        }
        game.update(secs(start));

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.round_index(), 2);
        let champions: Vec<bool> = game.players().iter().map(|p| p.is_champion).collect();
        assert_eq!(champions, [true, true, false]);
        assert_eq!(game.game_over_started_at(), Some(secs(start)));
        assert!(audio.calls().contains(&"cue Triumph".to_string()));

        game.update(secs(start + 100.0));
        assert_eq!(game.phase(), GamePhase::GameOver);

        game.skip_round(secs(start + 101.0));
        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 1);
        assert!(game.players().iter().all(|p| p.score == 0 && !p.is_champion));
        assert_ne!(game.match_id(), first_match);
    }

    #[test]
    fn skipping_the_last_round_ends_the_match_in_place() {
        let audio = Recorder::default();
        let mut game = session_with(2, tracks(Category::Silicon), audio.clone(), Log::default());
        let open = into_voting(&mut game, 0.0);
        game.update(secs(open + 15.0));
        game.update(secs(open + 18.0));
        game.update(secs(open + 22.0));
        game.update(secs(open + 24.0));
        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 2);

        let skipped_at = open + 25.0;
        game.skip_round(secs(skipped_at));
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.game_over_started_at(), Some(secs(skipped_at)));
        assert!(audio.calls().ends_with(&["stop".to_string(), "cue Triumph".to_string()]));

        for step in 1..=10 {
            game.update(secs(skipped_at + 30.0 * f64::from(step)));
        }
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.round_index(), 2);
        assert!(game.players().iter().all(|p| p.is_champion));
        assert!(game.current_track().is_none());
    }

    #[test]
    fn skipping_the_last_vote_drops_it_before_the_podium() {
        let mut game = session(1);
        let open = into_voting(&mut game, 0.0);
        game.register_vote(0, Category::Silicon, secs(open + 1.0));

        game.skip_round(secs(open + 2.0));

        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.round_index(), 1);
        assert!(game.players().iter().all(|p| !p.has_voted() && p.score == 0));
    }

    #[test]
    fn pause_during_intermission_delays_the_next_round() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        game.update(secs(open + 15.0));
        game.update(secs(open + 18.0));
        game.update(secs(open + 22.0));
        assert_eq!(game.phase(), GamePhase::Intermission);
        let before = game.phase_window().unwrap();
        assert_eq!(before.started_at, secs(open + 22.0));
        assert_eq!(before.deadline, Some(secs(open + 24.0)));

        game.toggle_pause(secs(open + 23.0));
        game.update(secs(open + 30.0));
        assert_eq!(game.phase(), GamePhase::Intermission);
        game.toggle_pause(secs(open + 33.0));

        let after = game.phase_window().unwrap();
        assert_eq!(after.started_at, before.started_at + secs(10.0));
        assert_eq!(after.deadline, Some(secs(open + 34.0)));

        game.update(secs(open + 33.9));
        assert_eq!(game.phase(), GamePhase::Intermission);
        game.update(secs(open + 34.0));
        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 2);
    }

    #[test]
    fn unlimited_rounds_never_reach_game_over() {
        let mut game = session(0);
        let mut start = 0.0;
        for _ in 0..8 {
            let open = into_voting(&mut game, start);
            game.update(secs(open + 15.0));
            game.update(secs(open + 18.0));
            game.update(secs(open + 22.0));
            start = open + 24.0;
        }
        game.update(secs(start));
        assert_eq!(game.phase(), GamePhase::Choosing);
        assert_eq!(game.round_index(), 9);
    }

    #[test]
    fn empty_library_is_a_permanent_error() {
        let mut game = session_with(6, Vec::new(), Recorder::default(), Log::default());
        for step in 0..5 {
            game.update(secs(f64::from(step)));
            game.skip_round(secs(f64::from(step)));
            game.toggle_pause(secs(f64::from(step)));
            assert_eq!(game.phase(), GamePhase::Error);
        }
        assert_eq!(game.error_message(), Some(NO_SONGS_MESSAGE));
        assert!(!game.is_paused());
    }

    #[test]
    fn unplayable_tracks_are_skipped_until_none_remain() {
        let bad = Track::new("songs/bad.mp3", Category::Soul);
        let good = Track::new("songs/good.mp3", Category::Silicon);
        let mut game = GameSession::new(
            settings(6),
            Box::new(FakeSongs {
                tracks: vec![bad.clone(), good.clone()],
                unplayable: [bad.path.clone()].into(),
            }),
            Box::new(Recorder::default()),
            Box::new(Log::default()),
        );
        game.update(Duration::ZERO);
        assert_eq!(game.current_track(), Some(&good));

        let mut broken = GameSession::new(
            settings(6),
            Box::new(FakeSongs {
                tracks: vec![bad.clone()],
                unplayable: [bad.path.clone()].into(),
            }),
            Box::new(Recorder::default()),
            Box::new(Log::default()),
        );
        broken.update(Duration::ZERO);
        assert_eq!(broken.phase(), GamePhase::Error);
        assert_eq!(broken.error_message(), Some(NO_PLAYABLE_SONGS_MESSAGE));
    }

    #[test]
    fn music_and_log_failures_do_not_stop_the_round() {
        let audio = Recorder {
            music_fails: true,
            ..Recorder::default()
        };
        let log = Log {
            fails: true,
            ..Log::default()
        };
        let mut game = session_with(6, tracks(Category::Silicon), audio, log);
        let open = into_voting(&mut game, 0.0);
        assert!(game.register_vote(0, Category::Silicon, secs(open)));
        game.update(secs(open + 15.0));
        game.update(secs(open + 18.0));
        assert_eq!(game.phase(), GamePhase::Reveal);
        assert_eq!(game.players()[0].score, 3);
    }

    #[test]
    fn reveal_seeds_score_animation_for_changed_scores() {
        let mut game = session(6);
        let open = into_voting(&mut game, 0.0);
        game.register_vote(0, Category::Silicon, secs(open));
        game.update(secs(open + 15.0));
        game.update(secs(open + 18.0));

        let animation = game.players()[0].score_animation.unwrap();
        assert_eq!(animation.start, secs(open + 18.0));
        assert_eq!(animation.from, 0.0);
        assert_eq!(animation.to, 3.0);
        assert!(game.players()[1].score_animation.is_none());
    }

    #[test]
    fn roulette_ticks_slow_down() {
        let audio = Recorder::default();
        let mut game = session_with(6, tracks(Category::Silicon), audio.clone(), Log::default());
        game.update(Duration::ZERO);
        let mut t = 0.0;
        while t < 3.0 {
            game.update(secs(t));
            t += 0.01;
        }
        let ticks = audio
            .calls()
            .iter()
            .filter(|c| c.as_str() == "cue Tick")
            .count();
        // 50 ms at the start, 350 ms at the end: well over a handful, far under 60.
        assert!((10..60).contains(&ticks), "got {ticks} ticks");
    }

    #[test]
    fn live_worth_only_while_voting() {
        let mut game = session(6);
        game.update(Duration::ZERO);
        assert_eq!(game.current_speed_points(secs(1.0)), None);

        let open = into_voting(&mut game, 0.0);
        assert_eq!(game.current_speed_points(secs(open)), Some(3));
        assert_eq!(game.current_speed_points(secs(open + 15.0)), Some(1));
    }

    #[test]
    fn player_names_skip_blanks() {
        let mut game = session(6);
        game.set_player_names(["  Ada ", " ", "Grace", "Extra", "More"]);
        let names: Vec<&str> = game.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ada", "Grace", "Extra"]);
        assert_eq!(game.players().len(), 3);
    }
}
