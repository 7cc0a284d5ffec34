/// Admin service for host controls.
pub mod admin_service;
/// Audio sinks and sound cues.
pub mod audio_service;
/// WebSocket vote controllers and their feedback.
pub mod controller_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Tick loop owning the match.
pub mod game_loop;
/// Health check service.
pub mod health_service;
/// Keyboard bindings and stdin reader.
pub mod keyboard;
/// Public service for read-only game information.
pub mod public_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
