use std::{fs, path::Path, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use silicon_or_soul::{
    config::{GameSettings, SongsConfig},
    dao::{round_log::JsonlRoundLogger, songs::SongLibrary},
    dto::phase::VisibleGamePhase,
    services::{
        audio_service::MutedAudio,
        controller_service::NoControllers,
        game_loop::{GameLoop, LoopInputs},
    },
    state::{
        SseHub,
        game::{Category, HostAction, InputEvent, VoteAction},
        session::{GameSession, NO_SONGS_MESSAGE},
        state_machine::GamePhase,
    },
};

const STEP: Duration = Duration::from_millis(100);

fn library_with_one_ai_track(root: &Path) -> SongLibrary {
    let ai_dir = root.join("ai");
    let human_dir = root.join("human");
    fs::create_dir_all(&ai_dir).unwrap();
    fs::create_dir_all(&human_dir).unwrap();
    fs::write(ai_dir.join("robot.mp3"), b"not really audio").unwrap();
    fs::write(ai_dir.join("notes.txt"), b"ignored").unwrap();

    SongLibrary::scan(&SongsConfig {
        ai_dir,
        human_dir,
        recent_memory: 3,
    })
}

fn settings(total_rounds: i32) -> GameSettings {
    GameSettings {
        total_rounds,
        ..GameSettings::default()
    }
}

/// Tick the session every `STEP` until it reaches `phase`, returning the time it got there.
fn run_until(session: &mut GameSession, mut now: Duration, phase: GamePhase) -> Duration {
    for _ in 0..1_000 {
        if session.phase() == phase {
            return now;
        }
        now += STEP;
        session.update(now);
    }
    panic!("never reached {phase:?}, stuck in {:?}", session.phase());
}

#[test]
fn two_round_match_is_scored_logged_and_crowned() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("rounds.jsonl");
    let mut session = GameSession::new(
        settings(2),
        Box::new(library_with_one_ai_track(dir.path())),
        Box::new(MutedAudio),
        Box::new(JsonlRoundLogger::new(&log_path)),
    );
    session.set_player_names(["Ada", "  ", "Bob"]);

    session.update(Duration::ZERO);
    assert_eq!(session.phase(), GamePhase::Choosing);
    let mut now = run_until(&mut session, Duration::ZERO, GamePhase::Voting);

    // Blank names are skipped, so the seats are Ada, Bob and Player 3.
    // Ada answers instantly and right, Player 3 is wrong, Bob stays silent.
    assert!(session.register_vote(0, Category::Silicon, now));
    assert!(session.register_vote(2, Category::Soul, now + STEP));
    now = run_until(&mut session, now + STEP, GamePhase::Reveal);
    let scores: Vec<i32> = session.players().iter().map(|p| p.score).collect();
    assert_eq!(scores, [3, 0, -1]);

    now = run_until(&mut session, now, GamePhase::Choosing);
    assert_eq!(session.round_index(), 2);
    now = run_until(&mut session, now, GamePhase::Voting);
    assert!(session.register_vote(1, Category::Silicon, now));
    now = run_until(&mut session, now, GamePhase::GameOver);

    let champions: Vec<&str> = session
        .players()
        .iter()
        .filter(|p| p.is_champion)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(champions, ["Ada", "Bob"]);
    assert!(session.game_over_started_at().is_some());

    // The podium stays put until the host skips.
    session.update(now + Duration::from_secs(60));
    assert_eq!(session.phase(), GamePhase::GameOver);

    let log = fs::read_to_string(&log_path).unwrap();
    let records: Vec<Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["round_index"], 1);
    assert_eq!(records[0]["category"], "ai");
    assert_eq!(records[0]["players"][0]["name"], "Ada");
    assert_eq!(records[0]["players"][0]["points_delta"], 3);
    assert_eq!(records[0]["players"][2]["correct"], false);
    assert_eq!(records[1]["players"][1]["score_after"], 3);
    assert_eq!(records[0]["match_id"], records[1]["match_id"]);
    assert_eq!(
        records[0]["match_id"].as_str(),
        Some(session.match_id().to_string().as_str())
    );
}

#[test]
fn skip_on_the_podium_starts_a_fresh_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = GameSession::new(
        settings(1),
        Box::new(library_with_one_ai_track(dir.path())),
        Box::new(MutedAudio),
        Box::new(JsonlRoundLogger::new(dir.path().join("rounds.jsonl"))),
    );

    session.update(Duration::ZERO);
    let now = run_until(&mut session, Duration::ZERO, GamePhase::Voting);
    session.register_vote(0, Category::Silicon, now);
    let now = run_until(&mut session, now, GamePhase::GameOver);
    let first_match = session.match_id();

    session.skip_round(now);

    assert_eq!(session.phase(), GamePhase::Choosing);
    assert_eq!(session.round_index(), 1);
    assert_ne!(session.match_id(), first_match);
    assert!(session.players().iter().all(|p| p.score == 0 && !p.is_champion));
}

#[test]
fn empty_library_halts_with_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let library = SongLibrary::scan(&SongsConfig {
        ai_dir: dir.path().join("missing-ai"),
        human_dir: dir.path().join("missing-human"),
        recent_memory: 3,
    });
    let mut session = GameSession::new(
        settings(6),
        Box::new(library),
        Box::new(MutedAudio),
        Box::new(JsonlRoundLogger::new(dir.path().join("rounds.jsonl"))),
    );

    for second in 0..30 {
        session.update(Duration::from_secs(second));
    }
    session.skip_round(Duration::from_secs(31));

    assert_eq!(session.phase(), GamePhase::Error);
    assert_eq!(session.error_message(), Some(NO_SONGS_MESSAGE));
    assert_eq!(session.round_index(), 0);
}

#[test]
fn host_loop_applies_console_inputs_and_publishes_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let session = GameSession::new(
        settings(3),
        Box::new(library_with_one_ai_track(dir.path())),
        Box::new(MutedAudio),
        Box::new(JsonlRoundLogger::new(dir.path().join("rounds.jsonl"))),
    );
    let (console, console_rx) = mpsc::unbounded_channel();
    let (shutdown, _) = watch::channel(false);
    let hub = SseHub::new(256);
    let mut events = hub.subscribe();
    let (mut game_loop, snapshots) = GameLoop::new(
        session,
        LoopInputs {
            console: console_rx,
            controllers: None,
        },
        Arc::new(NoControllers),
        hub,
        Arc::new(shutdown),
    );

    game_loop.tick(Duration::ZERO);
    game_loop.tick(Duration::from_secs(3));
    assert_eq!(snapshots.borrow().phase, VisibleGamePhase::Voting);
    assert_eq!(snapshots.borrow().current_worth, Some(3));

    for player_index in 0..3 {
        console
            .send(InputEvent::Vote(VoteAction {
                player_index,
                choice: Category::Silicon,
            }))
            .unwrap();
    }
    game_loop.tick(Duration::from_secs(4));
    assert_eq!(snapshots.borrow().phase, VisibleGamePhase::PreReveal);
    assert!(snapshots.borrow().players.iter().all(|p| p.has_voted));
    assert!(snapshots.borrow().track.is_none());

    game_loop.tick(Duration::from_secs(7));
    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.phase, VisibleGamePhase::Reveal);
    assert_eq!(
        snapshot.track.map(|track| track.category),
        Some(Category::Silicon)
    );
    assert!(snapshot.players.iter().all(|p| p.points_delta > 0));

    // Pausing freezes the reveal: the intermission does not start while paused.
    console.send(InputEvent::Host(HostAction::Pause)).unwrap();
    game_loop.tick(Duration::from_secs(8));
    game_loop.tick(Duration::from_secs(30));
    assert!(snapshots.borrow().paused);
    assert_eq!(snapshots.borrow().phase, VisibleGamePhase::Reveal);

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.extend(event.event);
    }
    for expected in ["game.snapshot", "vote.locked", "round.revealed"] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}");
    }
}
