//! Turns hub subscriptions into SSE responses for displays and the host console.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, future, stream};
use tokio::sync::watch;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{AdminHandshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

const EVENT_GAME_SNAPSHOT: &str = "game.snapshot";
const EVENT_ADMIN_TOKEN: &str = "admin_token";
const EVENT_INFO: &str = "info";
const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Lives exactly as long as one SSE response.
///
/// Dropping it logs the disconnect and, for the admin stream, frees the admin seat.
struct Subscription {
    stream: &'static str,
    admin: Option<(SharedState, String)>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some((state, token)) = self.admin.take() {
            state.sse().release_admin_token(&token);
        }
        info!(stream = self.stream, "SSE stream disconnected");
    }
}

/// Open a display stream. The current snapshot is sent first so a fresh display does not
/// wait for the next change.
pub fn open_public_stream(
    state: &SharedState,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let receiver = state.public_sse().subscribe();
    info!("public SSE stream connected");
    state.public_sse().broadcast(ServerEvent::new(
        Some(EVENT_INFO.to_string()),
        "public stream connected".to_string(),
    ));

    let initial = match ServerEvent::json(Some(EVENT_GAME_SNAPSHOT.to_string()), &state.snapshot())
    {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize initial snapshot");
            None
        }
    };

    into_sse(
        initial,
        BroadcastStream::new(receiver),
        state.shutdown_watcher(),
        Subscription {
            stream: "public",
            admin: None,
        },
    )
}

/// Open the host stream, claiming the admin seat. Fails while another admin is connected.
pub fn open_admin_stream(
    state: &SharedState,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let token = state.sse().claim_admin_token().ok_or_else(|| {
        ServiceError::Unauthorized("Another admin SSE stream is already active".into())
    })?;
    let receiver = state.admin_sse().subscribe();
    info!("admin SSE stream connected");

    let handshake = ServerEvent::json(
        Some(EVENT_ADMIN_TOKEN.to_string()),
        &AdminHandshake {
            token: token.clone(),
        },
    )
    .map_err(|err| {
        state.sse().release_admin_token(&token);
        ServiceError::InvalidState(format!("failed to encode admin handshake: {err}"))
    })?;

    Ok(into_sse(
        Some(handshake),
        BroadcastStream::new(receiver),
        state.shutdown_watcher(),
        Subscription {
            stream: "admin",
            admin: Some((state.clone(), token)),
        },
    ))
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Build the response: `initial` first, then live events until the client leaves or the
/// server shuts down, which lets graceful shutdown complete.
fn into_sse(
    initial: Option<ServerEvent>,
    live: BroadcastStream<ServerEvent>,
    mut shutdown: watch::Receiver<bool>,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let live = live.filter_map(move |received| {
        let _subscription = &subscription;
        future::ready(match received {
            Ok(payload) => Some(payload),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                // Snapshots are self-contained; the next one catches the client up.
                debug!(skipped, "SSE subscriber lagged");
                None
            }
        })
    });

    let shutting_down = async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    };
    let events = stream::iter(initial)
        .chain(live)
        .take_until(shutting_down)
        .map(|payload| Ok(to_event(payload)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}
