use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the first round.
    Init,
    /// Roulette before the track starts.
    Choosing,
    /// Track playing, votes open.
    Voting,
    /// Suspense before the answer.
    PreReveal,
    /// Answer and points on screen.
    Reveal,
    /// Short wait before the next round.
    Intermission,
    /// Champion podium.
    GameOver,
    /// Halted, see the error message.
    Error,
}

impl VisibleGamePhase {
    /// Whether the round's answer may be shown.
    pub fn is_revealed(self) -> bool {
        matches!(
            self,
            VisibleGamePhase::Reveal | VisibleGamePhase::Intermission | VisibleGamePhase::GameOver
        )
    }
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Init => VisibleGamePhase::Init,
            GamePhase::Choosing => VisibleGamePhase::Choosing,
            GamePhase::Voting => VisibleGamePhase::Voting,
            GamePhase::PreReveal => VisibleGamePhase::PreReveal,
            GamePhase::Reveal => VisibleGamePhase::Reveal,
            GamePhase::Intermission => VisibleGamePhase::Intermission,
            GamePhase::GameOver => VisibleGamePhase::GameOver,
            GamePhase::Error => VisibleGamePhase::Error,
        }
    }
}
