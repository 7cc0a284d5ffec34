use tracing::warn;

use crate::{dto::health::HealthResponse, dto::phase::VisibleGamePhase, state::SharedState};

/// Report `error` while the match is halted, `ok` otherwise.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let snapshot = state.snapshot();
    if snapshot.phase == VisibleGamePhase::Error {
        warn!(
            reason = snapshot.error_message.as_deref().unwrap_or_default(),
            "healthcheck while halted"
        );
        HealthResponse::error()
    } else {
        HealthResponse::ok()
    }
}
