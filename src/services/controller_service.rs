//! Hardware vote controllers connected over WebSocket.
//!
//! Each connection task only ever publishes validated [`VoteAction`]s onto the controller
//! channel; the game loop is the single consumer.

use std::{sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use dashmap::{DashMap, mapref::entry::Entry};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::{
    sync::{RwLock, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        sse::ControllerPresenceEvent,
        ws::{ControllerCommand, ControllerInbound, ControllerOutbound},
    },
    state::{
        SseHub,
        game::{InputEvent, VoteAction},
    },
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
const EVENT_CONTROLLER_CONNECTED: &str = "controller.connected";
const EVENT_CONTROLLER_DISCONNECTED: &str = "controller.disconnected";

/// One-way hardware feedback triggered by phase changes.
pub trait ControllerFeedback: Send + Sync {
    /// Push `command` to every connected device.
    fn send_all(&self, command: ControllerCommand);
}

/// Feedback sink used when controllers are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControllers;

impl ControllerFeedback for NoControllers {
    fn send_all(&self, _command: ControllerCommand) {}
}

#[derive(Clone)]
/// Handle used to push messages to a connected controller.
struct ControllerConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

/// Registry of connected controllers and producer side of the controller channel.
pub struct ControllerHub {
    connections: DashMap<usize, ControllerConnection>,
    events: RwLock<Option<mpsc::UnboundedSender<InputEvent>>>,
    player_count: usize,
    public: SseHub,
}

impl ControllerHub {
    /// Create the hub and the receiving end the game loop drains.
    pub fn new(player_count: usize, public: SseHub) -> (Self, mpsc::UnboundedReceiver<InputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            connections: DashMap::new(),
            events: RwLock::new(Some(tx)),
            player_count,
            public,
        };
        (hub, rx)
    }

    /// Number of connected controllers.
    pub fn connected(&self) -> usize {
        self.connections.len()
    }

    /// Claim a seat. The first controller wins; returns the connection id on success.
    fn register(&self, player_index: usize, tx: mpsc::UnboundedSender<Message>) -> Option<Uuid> {
        if player_index >= self.player_count {
            return None;
        }
        match self.connections.entry(player_index) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(ControllerConnection { id, tx });
                Some(id)
            }
        }
    }

    fn unregister(&self, player_index: usize, id: Uuid) {
        self.connections
            .remove_if(&player_index, |_, conn| conn.id == id);
    }

    /// Forward a vote to the game loop. Returns false once the hub is closed.
    pub async fn publish(&self, action: VoteAction) -> bool {
        let guard = self.events.read().await;
        match guard.as_ref() {
            Some(tx) => tx.send(action.into()).is_ok(),
            None => false,
        }
    }

    async fn is_open(&self) -> bool {
        self.events.read().await.is_some()
    }

    /// Stop accepting events, close every connection and wait for them to drain.
    pub async fn close(&self) {
        // Dropping the sender under the write lock guarantees nothing is enqueued afterwards.
        self.events.write().await.take();

        for entry in self.connections.iter() {
            let _ = entry.tx.send(Message::Close(None));
        }

        let drained = tokio::time::timeout(CLOSE_TIMEOUT, async {
            while !self.connections.is_empty() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = self.connections.len(),
                "controllers did not disconnect in time"
            );
        } else {
            info!("controller hub closed");
        }
    }

    fn broadcast_presence(&self, event: &str, player_index: usize) {
        self.public
            .publish(event, &ControllerPresenceEvent { player_index });
    }
}

impl ControllerFeedback for ControllerHub {
    fn send_all(&self, command: ControllerCommand) {
        let message = ControllerOutbound { command };
        for entry in self.connections.iter() {
            if send_message_to_websocket(&entry.tx, &message).is_err() {
                debug!(player_index = *entry.key(), "controller writer closed");
            }
        }
    }
}

/// Handle the full lifecycle for an individual controller WebSocket connection.
pub async fn handle_socket(hub: Arc<ControllerHub>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("controller identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let player_index = match ControllerInbound::from_json_str(&initial_message) {
        Ok(message) => message.identified_player(),
        Err(err) => {
            warn!(error = %err, "failed to parse or validate controller message");
            None
        }
    };
    let Some(player_index) = player_index else {
        warn!("first controller message was not a valid identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    if !hub.is_open().await {
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let Some(connection_id) = hub.register(player_index, outbound_tx.clone()) else {
        warn!(player_index, "seat unknown or already claimed; closing controller");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    info!(player_index, "controller connected");
    hub.broadcast_presence(EVENT_CONTROLLER_CONNECTED, player_index);

    let reset = ControllerOutbound {
        command: ControllerCommand::Reset,
    };
    if send_message_to_websocket(&outbound_tx, &reset).is_ok() {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match ControllerInbound::from_json_str(&text) {
                    Ok(ControllerInbound::Vote { choice }) => {
                        let action = VoteAction {
                            player_index,
                            choice: choice.into(),
                        };
                        if !hub.publish(action).await {
                            info!(player_index, "hub closed; dropping controller");
                            break;
                        }
                    }
                    Ok(ControllerInbound::Identification { .. }) => {
                        warn!(player_index, "ignoring duplicate identification message");
                    }
                    Ok(ControllerInbound::Unknown) => {
                        debug!(player_index, payload = %text, "ignoring unknown controller message");
                    }
                    Err(err) => {
                        warn!(player_index, error = %err, "failed to parse or validate controller message");
                    }
                },
                Ok(Message::Ping(payload)) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Ok(Message::Close(frame)) => {
                    info!(player_index, "controller closed");
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
                Err(err) => {
                    warn!(player_index, error = %err, "websocket error");
                    break;
                }
            }
        }
    }

    hub.unregister(player_index, connection_id);
    info!(player_index, "controller disconnected");
    hub.broadcast_presence(EVENT_CONTROLLER_DISCONNECTED, player_index);

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; a closed writer is reported.
fn send_message_to_websocket<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), ()>
where
    T: ?Sized + Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
