//! Library crate for silicon-or-soul, exposing modules for binaries and integration tests.

pub mod config;
/// Song library and round log.
pub mod dao;
/// Wire shapes for REST, SSE and controller frames.
pub mod dto;
mod error;
/// HTTP routers.
pub mod routes;
/// Game loop, inputs and outward-facing services.
pub mod services;
/// Match state, phase machine and shared application state.
pub mod state;
