//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    validation::{player_seat_index, validate_controller_player},
    ws::VoteChoice,
};

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Vote cast on behalf of a player, e.g. from a host tablet.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// Seat as `PLAYER_<n>`, same naming as the controllers.
    pub player: String,
    /// Answer to lock in.
    pub choice: VoteChoice,
}

impl Validate for VoteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_controller_player(&self.player) {
            errors.add("player", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl VoteRequest {
    /// 0-based player index, once validated.
    pub fn player_index(&self) -> Option<usize> {
        player_seat_index(&self.player)
    }
}
