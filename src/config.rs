//! Application-level configuration loading: timings, scoring, players, key bindings and paths.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_with::{DurationSecondsWithFrac, serde_as};
use tracing::{info, warn};

use crate::{services::audio_service::Cue, state::scoring::ScoringRules};

/// Default location on disk where the game looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SILICON_OR_SOUL_CONFIG_PATH";
const DEFAULT_SPEED_EXPONENT: f64 = 0.5;

/// Durations of every timed phase.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhaseTimings {
    /// Roulette before the track starts.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub choosing: Duration,
    /// Longest the voting window stays open.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub voting_timeout: Duration,
    /// Suspense between voting and the answer.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub pre_reveal: Duration,
    /// How long the answer is shown.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub reveal: Duration,
    /// Pause before the next round or the podium.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub intermission: Duration,
    /// Roulette tick interval at the start of the choosing phase.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub tick_interval_start: Duration,
    /// Roulette tick interval at the end of the choosing phase.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub tick_interval_end: Duration,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            choosing: Duration::from_secs(3),
            voting_timeout: Duration::from_secs(15),
            pre_reveal: Duration::from_secs(3),
            reveal: Duration::from_secs(4),
            intermission: Duration::from_secs(2),
            tick_interval_start: Duration::from_millis(50),
            tick_interval_end: Duration::from_millis(350),
        }
    }
}

/// Everything the match itself needs, handed to it by value at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Phase durations.
    pub timings: PhaseTimings,
    /// Points for right and wrong answers.
    pub scoring: ScoringRules,
    /// Rounds per match; zero or less means unlimited.
    pub total_rounds: i32,
    /// Initial display names, one per player.
    pub player_names: Vec<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            timings: PhaseTimings::default(),
            scoring: ScoringRules::default(),
            total_rounds: 6,
            player_names: default_players().into_iter().map(|p| p.name).collect(),
        }
    }
}

/// Where tracks live on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SongsConfig {
    /// Folder of AI-generated tracks.
    pub ai_dir: PathBuf,
    /// Folder of human-made tracks.
    pub human_dir: PathBuf,
    /// How many recent picks the library tries not to repeat.
    pub recent_memory: usize,
}

impl Default for SongsConfig {
    fn default() -> Self {
        Self {
            ai_dir: PathBuf::from("songs/ai"),
            human_dir: PathBuf::from("songs/human"),
            recent_memory: 3,
        }
    }
}

/// Keys a player presses to vote.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerKeys {
    /// Votes Silicon.
    pub silicon: char,
    /// Votes Soul.
    pub soul: char,
}

/// Host keys for pause, skip and quit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostKeys {
    /// Toggles the pause.
    pub pause: char,
    /// Skips the round.
    pub skip: char,
    /// Quits the game.
    pub quit: char,
}

impl Default for HostKeys {
    fn default() -> Self {
        Self {
            pause: 'p',
            skip: 'n',
            quit: 'q',
        }
    }
}

/// One configured player seat.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerSeat {
    /// Initial display name.
    pub name: String,
    /// Voting keys.
    pub keys: PlayerKeys,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    game: GameSettings,
    players: Vec<PlayerSeat>,
    host_keys: HostKeys,
    songs: SongsConfig,
    log_path: PathBuf,
    sounds: IndexMap<Cue, String>,
    tick_rate_hz: u32,
    controllers_enabled: bool,
    keyboard_enabled: bool,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to baked-in defaults.
    ///
    /// `override_path` (the `--config` flag) wins over the environment variable.
    pub fn load(override_path: Option<PathBuf>) -> Self {
        let path = override_path.unwrap_or_else(resolve_config_path);
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        players = app_config.players.len(),
                        total_rounds = app_config.game.total_rounds,
                        "loaded game config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and sanitise a JSON document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Settings handed to the match.
    pub fn game(&self) -> &GameSettings {
        &self.game
    }

    /// Player seats with their key bindings.
    pub fn players(&self) -> &[PlayerSeat] {
        &self.players
    }

    /// Host key bindings.
    pub fn host_keys(&self) -> &HostKeys {
        &self.host_keys
    }

    /// Song folders.
    pub fn songs(&self) -> &SongsConfig {
        &self.songs
    }

    /// Round log file.
    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    /// Cue to sample file mapping, in configuration order.
    pub fn sounds(&self) -> &IndexMap<Cue, String> {
        &self.sounds
    }

    /// Game loop period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }

    /// Whether the controller WebSocket endpoint accepts devices.
    pub fn controllers_enabled(&self) -> bool {
        self.controllers_enabled
    }

    /// Whether stdin is read for key presses.
    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    timings: PhaseTimings,
    scoring: ScoringRules,
    total_rounds: i32,
    players: Vec<PlayerSeat>,
    host_keys: HostKeys,
    songs: SongsConfig,
    log_path: PathBuf,
    sounds: IndexMap<Cue, String>,
    tick_rate_hz: u32,
    controllers_enabled: bool,
    keyboard_enabled: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            timings: PhaseTimings::default(),
            scoring: ScoringRules::default(),
            total_rounds: 6,
            players: default_players(),
            host_keys: HostKeys::default(),
            songs: SongsConfig::default(),
            log_path: PathBuf::from("logs/game_log.jsonl"),
            sounds: default_sounds(),
            tick_rate_hz: 60,
            controllers_enabled: true,
            keyboard_enabled: true,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let players = if value.players.is_empty() {
            warn!("config lists no players; using the default seats");
            default_players()
        } else {
            value.players
        };

        let game = GameSettings {
            timings: value.timings,
            scoring: sanitize_scoring(value.scoring),
            total_rounds: value.total_rounds,
            player_names: players.iter().map(|seat| seat.name.clone()).collect(),
        };

        Self {
            game,
            players,
            host_keys: value.host_keys,
            songs: value.songs,
            log_path: value.log_path,
            sounds: value.sounds,
            tick_rate_hz: value.tick_rate_hz.max(1),
            controllers_enabled: value.controllers_enabled,
            keyboard_enabled: value.keyboard_enabled,
        }
    }
}

fn sanitize_scoring(mut scoring: ScoringRules) -> ScoringRules {
    if !(scoring.speed_exponent.is_finite() && scoring.speed_exponent > 0.0) {
        warn!(
            exponent = scoring.speed_exponent,
            "speed exponent must be positive; using the default"
        );
        scoring.speed_exponent = DEFAULT_SPEED_EXPONENT;
    }
    if scoring.max_points < scoring.min_points {
        warn!(
            min = scoring.min_points,
            max = scoring.max_points,
            "max points below min points; swapping them"
        );
        std::mem::swap(&mut scoring.min_points, &mut scoring.max_points);
    }
    scoring
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_players() -> Vec<PlayerSeat> {
    [('a', 's'), ('d', 'f'), ('g', 'h')]
        .into_iter()
        .enumerate()
        .map(|(index, (silicon, soul))| PlayerSeat {
            name: format!("Player {}", index + 1),
            keys: PlayerKeys { silicon, soul },
        })
        .collect()
}

fn default_sounds() -> IndexMap<Cue, String> {
    [
        (Cue::Start, "start.wav"),
        (Cue::LockIn, "lock_in.wav"),
        (Cue::Reveal, "reveal.wav"),
        (Cue::Win, "win.wav"),
        (Cue::Lose, "lose.wav"),
        (Cue::Drumroll, "drumroll.wav"),
        (Cue::Triumph, "triumph.wav"),
        (Cue::Tick, "tick.wav"),
    ]
    .into_iter()
    .map(|(cue, file)| (cue, file.to_string()))
    .collect()
}
