use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::common::PlayerSnapshot,
    services::audio_service::Cue,
    state::game::Category,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; unnamed events are plain messages.
    pub event: Option<String>,
    /// Pre-rendered data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from pre-rendered data.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Token handed to the admin stream subscriber.
pub struct AdminHandshake {
    /// Value for the `X-Admin-Token` header.
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// What the display front-end should do with the music.
pub enum MusicAction {
    /// Start `path` from the beginning.
    Play,
    /// Stop and forget the current track.
    Stop,
    /// Hold the current position.
    Pause,
    /// Continue from the held position.
    Resume,
}

#[derive(Debug, Serialize, ToSchema)]
/// `audio.music` payload.
pub struct MusicEvent {
    /// What to do.
    pub action: MusicAction,
    /// Track to play, only set for [`MusicAction::Play`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// `audio.cue` payload.
pub struct CueEvent {
    /// Which effect to play.
    pub cue: Cue,
    /// Sample file configured for the cue.
    pub file: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// `vote.locked` payload. The choice stays hidden until the reveal.
pub struct VoteLockedEvent {
    /// 0-based seat.
    pub player_index: usize,
    /// Display name of the seat.
    pub player: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// `round.revealed` payload.
pub struct RoundRevealedEvent {
    /// 1-based round.
    pub round_index: u32,
    /// Right answer.
    pub correct: Category,
    /// Players with their revealed votes and deltas.
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Debug, Serialize, ToSchema)]
/// `controller.connected` / `controller.disconnected` payload.
pub struct ControllerPresenceEvent {
    /// 0-based seat the controller drives.
    pub player_index: usize,
}
