use axum::Router;

use crate::state::SharedState;

/// Host controls.
pub mod admin;
/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Read-only match state.
pub mod public;
/// Display and host event streams.
pub mod sse;
/// Controller WebSocket endpoint.
pub mod websocket;

/// Compose every route tree and bind the shared state.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(public::router())
        .merge(sse::router())
        .merge(websocket::router())
        .merge(admin::router(state.clone()))
        .merge(docs::router());

    api_router.with_state(state)
}
