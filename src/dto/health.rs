use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "error").
    pub status: String,
}

impl HealthResponse {
    /// Create a health response indicating the match is running.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Create a health response indicating the match halted on an error.
    pub fn error() -> Self {
        Self {
            status: "error".to_string(),
        }
    }
}
