use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Fan-out hubs behind the two SSE streams, plus the single admin seat.
pub struct SseState {
    public: SseHub,
    admin: SseHub,
    admin_token: Mutex<Option<String>>,
}

impl SseState {
    /// Build both hubs with their channel capacities.
    pub fn new(public_capacity: usize, admin_capacity: usize) -> Self {
        Self {
            public: SseHub::new(public_capacity),
            admin: SseHub::new(admin_capacity),
            admin_token: Mutex::new(None),
        }
    }

    /// Hub read by every display.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Hub read by the host console only.
    pub fn admin(&self) -> &SseHub {
        &self.admin
    }

    /// Hand out a fresh admin token, unless another admin stream already holds one.
    pub fn claim_admin_token(&self) -> Option<String> {
        let mut slot = self.token_slot();
        if slot.is_some() {
            return None;
        }
        let token = Uuid::new_v4().simple().to_string();
        *slot = Some(token.clone());
        Some(token)
    }

    /// Free the admin seat if `token` still owns it.
    pub fn release_admin_token(&self, token: &str) {
        let mut slot = self.token_slot();
        if slot.as_deref() == Some(token) {
            slot.take();
        }
    }

    /// Token of the connected admin stream, if any.
    pub fn admin_token(&self) -> Option<String> {
        self.token_slot().clone()
    }

    fn token_slot(&self) -> MutexGuard<'_, Option<String>> {
        // The slot holds a plain value, so a poisoned lock is still consistent.
        self.admin_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Broadcast channel feeding one SSE stream. Clones share the same channel.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Create a hub keeping at most `capacity` undelivered events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers; having none is fine.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Serialise `payload` as a named event and broadcast it.
    pub fn publish<T: Serialize>(&self, event: &str, payload: &T) {
        match ServerEvent::json(Some(event.to_string()), payload) {
            Ok(message) => self.broadcast(message),
            Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
        }
    }
}
