/// Pause-aware effective time.
pub mod clock;
/// Players, tracks and input events.
pub mod game;
pub mod scoring;
pub mod session;
mod sse;
/// Phase transition table.
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    config::AppConfig, dto::common::GameSnapshot, services::controller_service::ControllerHub,
    state::game::InputEvent,
};

pub use self::sse::{SseHub, SseState};

/// Handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// State shared with the HTTP layer. The match itself lives in the game loop task; handlers
/// only read snapshots and enqueue input events.
pub struct AppState {
    config: Arc<AppConfig>,
    sse: SseState,
    console: mpsc::UnboundedSender<InputEvent>,
    controllers: Option<Arc<ControllerHub>>,
    snapshot: watch::Receiver<GameSnapshot>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: Arc<AppConfig>,
        sse: SseState,
        console: mpsc::UnboundedSender<InputEvent>,
        controllers: Option<Arc<ControllerHub>>,
        snapshot: watch::Receiver<GameSnapshot>,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> SharedState {
        Arc::new(Self {
            config,
            sse,
            console,
            controllers,
            snapshot,
            shutdown,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin()
    }

    /// Both SSE hubs and the admin seat.
    pub fn sse(&self) -> &SseState {
        &self.sse
    }

    /// Enqueue an event on the console channel. Returns false once the game loop is gone.
    pub fn send_console(&self, event: InputEvent) -> bool {
        self.console.send(event).is_ok()
    }

    /// Controller hub, when controllers are enabled.
    pub fn controllers(&self) -> Option<&Arc<ControllerHub>> {
        self.controllers.as_ref()
    }

    /// Latest snapshot published by the game loop.
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Raise the shutdown flag: the game loop stops and open SSE streams end.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Subscribe to the shutdown flag.
    pub fn shutdown_watcher(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
