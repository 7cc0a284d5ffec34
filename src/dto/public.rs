use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::common::PlayerSnapshot;

/// Response payload listing the players of the running match.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayersResponse {
    /// Players in seat order.
    pub players: Vec<PlayerSnapshot>,
}
