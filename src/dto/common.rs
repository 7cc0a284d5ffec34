use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::phase::VisibleGamePhase,
    state::{
        game::{Category, Player},
        session::GameSession,
    },
};

/// Public projection of a player exposed to REST/SSE clients.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// 0-based seat.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Total score in this match.
    pub score: i32,
    /// Whether a vote is locked in this round.
    pub has_voted: bool,
    /// Locked choice, only once the round has been revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote: Option<Category>,
    /// Score change of the last revealed round.
    pub points_delta: i32,
    /// Answered the last revealed round correctly.
    pub is_winner: bool,
    /// Shares the top score on the podium.
    pub is_champion: bool,
}

impl PlayerSnapshot {
    /// Project a player, hiding its vote unless `revealed`.
    pub fn from_player(player: &Player, revealed: bool) -> Self {
        Self {
            index: player.index,
            name: player.name.clone(),
            score: player.score,
            has_voted: player.has_voted(),
            vote: if revealed { player.choice() } else { None },
            points_delta: player.points_delta,
            is_winner: player.is_winner,
            is_champion: player.is_champion,
        }
    }
}

/// Track details, only exposed after the reveal since the path gives the answer away.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct TrackSnapshot {
    /// File path of the track.
    pub path: String,
    /// Who made the track.
    pub category: Category,
}

/// Everything a display needs to render the current moment of the match.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct GameSnapshot {
    /// Identifier of the running match.
    pub match_id: Uuid,
    /// Bumped on every observable change.
    pub revision: u64,
    /// Current phase.
    pub phase: VisibleGamePhase,
    /// Whether the host paused the game.
    pub paused: bool,
    /// 1-based round; zero before the first one.
    pub round_index: u32,
    /// Zero or less means unlimited.
    pub total_rounds: i32,
    /// Time left before the phase ends on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_remaining_ms: Option<u64>,
    /// Points a correct vote would earn right now, while voting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_worth: Option<i32>,
    /// Current track, once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackSnapshot>,
    /// Why the game halted, in the error phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Players in seat order.
    pub players: Vec<PlayerSnapshot>,
}

impl GameSnapshot {
    /// Capture the session as seen at wall-clock `now`.
    pub fn capture(session: &GameSession, now: Duration) -> Self {
        let phase = VisibleGamePhase::from(session.phase());
        let revealed = phase.is_revealed();

        Self {
            match_id: session.match_id(),
            revision: session.revision(),
            phase,
            paused: session.is_paused(),
            round_index: session.round_index(),
            total_rounds: session.total_rounds(),
            phase_remaining_ms: session
                .phase_remaining(now)
                .map(|left| left.as_millis() as u64),
            current_worth: session.current_speed_points(now),
            track: session
                .current_track()
                .filter(|_| revealed)
                .map(|track| TrackSnapshot {
                    path: track.path.display().to_string(),
                    category: track.category,
                }),
            error_message: session.error_message().map(str::to_string),
            players: session
                .players()
                .iter()
                .map(|player| PlayerSnapshot::from_player(player, revealed))
                .collect(),
        }
    }
}
