//! Silicon or Soul binary entrypoint wiring the game loop, REST, WebSocket and SSE layers.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use silicon_or_soul::{
    config::AppConfig,
    dao::{
        round_log::{BackgroundRoundLogger, JsonlRoundLogger},
        songs::SongLibrary,
    },
    routes,
    services::{
        audio_service::SseAudioSink,
        controller_service::{ControllerFeedback, ControllerHub, NoControllers},
        game_loop::{GameLoop, LoopInputs},
        keyboard::{KeyMap, spawn_stdin_reader},
    },
    state::{AppState, SharedState, SseState, session::GameSession},
};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "silicon-or-soul", version, about = "AI or human? The music guessing party game")]
struct Cli {
    /// Name for the next player seat; repeat for several players.
    #[arg(long = "player-name", value_name = "NAME")]
    player_name: Vec<String>,
    /// Comma separated player names, applied after `--player-name` entries.
    #[arg(long = "player-names", value_name = "A,B,C")]
    player_names: Option<String>,
    /// Configuration file, overriding `SILICON_OR_SOUL_CONFIG_PATH`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// All names in seat order; blanks are filtered by the match itself.
    fn names(&self) -> Vec<String> {
        self.player_name
            .iter()
            .cloned()
            .chain(
                self.player_names
                    .iter()
                    .flat_map(|list| list.split(',').map(str::to_string)),
            )
            .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Arc::new(AppConfig::load(cli.config.clone()));
    let sse = SseState::new(64, 16);

    let library = SongLibrary::scan(config.songs());
    let audio = SseAudioSink::new(sse.public().clone(), config.sounds().clone());
    let (logger, log_writer) =
        BackgroundRoundLogger::spawn(JsonlRoundLogger::new(config.log_path().clone()));
    let mut session = GameSession::new(
        config.game().clone(),
        Box::new(library),
        Box::new(audio),
        Box::new(logger),
    );
    let names = cli.names();
    if !names.is_empty() {
        session.set_player_names(names);
    }
    let player_count = session.players().len();

    let (console_tx, console_rx) = mpsc::unbounded_channel();
    let (hub, controller_rx) = if config.controllers_enabled() {
        let (hub, rx) = ControllerHub::new(player_count, sse.public().clone());
        (Some(Arc::new(hub)), Some(rx))
    } else {
        info!("controllers disabled");
        (None, None)
    };
    let feedback: Arc<dyn ControllerFeedback> = match &hub {
        Some(hub) => hub.clone(),
        None => Arc::new(NoControllers),
    };

    let (shutdown, _) = watch::channel(false);
    let shutdown = Arc::new(shutdown);
    let (game_loop, snapshot_rx) = GameLoop::new(
        session,
        LoopInputs {
            console: console_rx,
            controllers: controller_rx,
        },
        feedback,
        sse.public().clone(),
        shutdown.clone(),
    );
    let loop_task = tokio::spawn(game_loop.run(config.tick_interval()));

    if config.keyboard_enabled() {
        if let Err(err) = spawn_stdin_reader(KeyMap::from_config(&config), console_tx.clone()) {
            warn!(error = %err, "failed to start keyboard reader");
        }
    }

    let app_state = AppState::new(
        config.clone(),
        sse,
        console_tx,
        hub.clone(),
        snapshot_rx,
        shutdown.clone(),
    );
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await
        .context("serving axum")?;

    shutdown.send_replace(true);
    if let Err(err) = loop_task.await {
        warn!(error = %err, "game loop task failed");
    }
    // The session owned the last log sender, so the writer ends once the queue is drained.
    if let Err(err) = log_writer.await {
        warn!(error = %err, "round log writer failed");
    }
    if let Some(hub) = hub {
        hub.close().await;
    }
    info!("bye");

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C, SIGTERM or a quit from the game loop.
async fn shutdown_signal(state: SharedState) {
    let mut quit = state.shutdown_watcher();
    let quit_requested = async move {
        let _ = quit.wait_for(|stop| *stop).await;
    };

    tokio::select! {
        _ = os_signal() => {
            info!("shutdown signal received");
            state.request_shutdown();
        }
        _ = quit_requested => info!("quit requested from the game"),
    }
}

async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_from_both_flags_are_concatenated() {
        let cli = Cli::parse_from([
            "silicon-or-soul",
            "--player-name",
            "Ada",
            "--player-names",
            "Bob, ,Cy",
        ]);
        assert_eq!(cli.names(), ["Ada", "Bob", " ", "Cy"]);
        assert!(cli.config.is_none());
    }
}
