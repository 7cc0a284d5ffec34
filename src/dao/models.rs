use serde::Serialize;
use uuid::Uuid;

use crate::state::game::Category;

/// Outcome of one completed round, as appended to the round log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    /// Identifier of the match the round belongs to.
    pub match_id: Uuid,
    /// 1-based index of the round within the match.
    pub round_index: u32,
    /// Path of the track that was played.
    pub track_path: String,
    /// `ai` or `human`.
    pub category: &'static str,
    /// Correct vote for the round.
    pub correct_answer: Category,
    /// Per-player outcome in player index order.
    pub players: Vec<PlayerRoundRecord>,
}

/// Per-player slice of a [`RoundRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRoundRecord {
    /// Display name at the time of the round.
    pub name: String,
    /// Locked choice, if any.
    pub vote: Option<Category>,
    /// Seconds between the voting window opening and the lock-in.
    pub reaction_time: Option<f64>,
    /// Whether the vote matched the answer.
    pub correct: bool,
    /// Score change this round.
    pub points_delta: i32,
    /// Total score after the round.
    pub score_after: i32,
}
