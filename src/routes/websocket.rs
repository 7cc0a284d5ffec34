use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{services::controller_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "controllers",
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 404, description = "Controllers are disabled")
    )
)]
/// Upgrade the HTTP connection into a controller WebSocket session.
pub async fn ws_handler(State(state): State<SharedState>, ws: WebSocketUpgrade) -> Response {
    let Some(hub) = state.controllers().cloned() else {
        return (StatusCode::NOT_FOUND, "controllers are disabled").into_response();
    };
    ws.on_upgrade(move |socket| controller_service::handle_socket(hub, socket))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
