//! Audio sinks driven by the match: music playback and one-shot cues.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::{
    dto::sse::{CueEvent, MusicAction, MusicEvent},
    state::SseHub,
};

const EVENT_AUDIO_MUSIC: &str = "audio.music";
const EVENT_AUDIO_CUE: &str = "audio.cue";

/// Named one-shot sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Voting opens.
    Start,
    /// A player locked a vote.
    LockIn,
    /// The answer appears.
    Reveal,
    /// At least one player was right.
    Win,
    /// Nobody was right.
    Lose,
    /// Suspense before the reveal.
    Drumroll,
    /// The podium appears.
    Triumph,
    /// One roulette step while choosing.
    Tick,
}

/// Where the match sends music and cue requests.
///
/// Implementations must never block the game loop.
pub trait AudioSink: Send {
    /// Start playing a track. Returns false when playback could not start.
    fn play_music(&self, path: &Path) -> bool;
    /// Stop the current track, if any.
    fn stop_music(&self);
    /// Pause the current track.
    fn pause_music(&self);
    /// Resume a paused track.
    fn resume_music(&self);
    /// Fire a one-shot effect.
    fn play_cue(&self, cue: Cue);
}

/// Publishes audio requests on the public SSE stream for the display front-end to play.
pub struct SseAudioSink {
    hub: SseHub,
    sounds: IndexMap<Cue, String>,
}

impl SseAudioSink {
    /// Build a sink bound to `hub`; `sounds` maps cues to sample file names.
    pub fn new(hub: SseHub, sounds: IndexMap<Cue, String>) -> Self {
        Self { hub, sounds }
    }

    fn send_music(&self, action: MusicAction, path: Option<&Path>) {
        self.hub.publish(
            EVENT_AUDIO_MUSIC,
            &MusicEvent {
                action,
                path: path.map(|p| p.display().to_string()),
            },
        );
    }
}

impl AudioSink for SseAudioSink {
    fn play_music(&self, path: &Path) -> bool {
        if !path.is_file() {
            warn!(path = %path.display(), "track file is missing; voting continues silently");
            return false;
        }
        self.send_music(MusicAction::Play, Some(path));
        true
    }

    fn stop_music(&self) {
        self.send_music(MusicAction::Stop, None);
    }

    fn pause_music(&self) {
        self.send_music(MusicAction::Pause, None);
    }

    fn resume_music(&self) {
        self.send_music(MusicAction::Resume, None);
    }

    fn play_cue(&self, cue: Cue) {
        self.hub.publish(
            EVENT_AUDIO_CUE,
            &CueEvent {
                cue,
                file: self.sounds.get(&cue).cloned(),
            },
        );
    }
}

/// Sink that swallows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutedAudio;

impl AudioSink for MutedAudio {
    fn play_music(&self, path: &Path) -> bool {
        debug!(path = %path.display(), "muted audio: play");
        true
    }

    fn stop_music(&self) {}

    fn pause_music(&self) {}

    fn resume_music(&self) {}

    fn play_cue(&self, _cue: Cue) {}
}
