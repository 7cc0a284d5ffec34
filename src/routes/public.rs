use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{common::GameSnapshot, public::PlayersResponse},
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints that expose the running match.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/state", get(get_state))
        .route("/public/players", get(get_players))
}

#[utoipa::path(
    get,
    path = "/public/state",
    tag = "public",
    responses((status = 200, description = "Latest match snapshot", body = GameSnapshot))
)]
/// Return the latest snapshot of the match.
pub async fn get_state(State(state): State<SharedState>) -> Json<GameSnapshot> {
    Json(public_service::current_state(&state))
}

#[utoipa::path(
    get,
    path = "/public/players",
    tag = "public",
    responses((status = 200, description = "Players and scores", body = PlayersResponse))
)]
/// Return the players with their scores.
pub async fn get_players(State(state): State<SharedState>) -> Json<PlayersResponse> {
    Json(public_service::players(&state))
}
