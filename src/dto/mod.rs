pub mod admin;
/// Snapshot shapes shared by several endpoints.
pub mod common;
/// Health check payload.
pub mod health;
/// Phase names as displayed to clients.
pub mod phase;
/// Read-only public endpoints.
pub mod public;
/// SSE event payloads.
pub mod sse;
pub mod validation;
/// Controller WebSocket frames.
pub mod ws;
