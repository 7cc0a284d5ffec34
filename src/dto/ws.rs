use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{player_seat_index, validate_controller_player},
    state::game::Category,
};

/// Vote choice as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    /// AI-generated.
    Silicon,
    /// Human-made.
    Soul,
}

impl From<VoteChoice> for Category {
    fn from(value: VoteChoice) -> Self {
        match value {
            VoteChoice::Silicon => Category::Silicon,
            VoteChoice::Soul => Category::Soul,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
/// Messages accepted from controller WebSocket clients.
#[serde(tag = "type")]
pub enum ControllerInbound {
    /// First frame: which seat this controller drives, as `PLAYER_<n>`.
    #[serde(rename = "identification")]
    Identification {
        /// Seat name.
        player: String,
    },
    /// A vote from an identified controller.
    #[serde(rename = "vote")]
    Vote {
        /// Answer to lock in.
        choice: VoteChoice,
    },
    /// Any other frame type; ignored.
    #[serde(other)]
    Unknown,
}

impl Validate for ControllerInbound {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Self::Identification { player } = self {
            if let Err(e) = validate_controller_player(player) {
                errors.add("player", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Why an inbound frame was rejected.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Not JSON, or not a known shape.
    #[error("malformed controller message: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed but with an invalid seat.
    #[error("invalid controller message: {0}")]
    Validation(#[from] ValidationErrors),
}

impl ControllerInbound {
    /// Parse and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    /// 0-based player index claimed by an identification frame.
    pub fn identified_player(&self) -> Option<usize> {
        match self {
            Self::Identification { player } => player_seat_index(player),
            _ => None,
        }
    }
}

/// Feedback commands pushed to every controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerCommand {
    /// Clear the lights for a new round.
    Reset,
    /// The track was AI-generated.
    WinSilicon,
    /// The track was human-made.
    WinSoul,
}

impl ControllerCommand {
    /// Command lighting up the winning side of a round.
    pub fn win(category: Category) -> Self {
        match category {
            Category::Silicon => Self::WinSilicon,
            Category::Soul => Self::WinSoul,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Frame sent to controllers.
pub struct ControllerOutbound {
    /// What the controller should show.
    pub command: ControllerCommand,
}
