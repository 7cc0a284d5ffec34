//! Keyboard bindings and the stdin reader feeding the console channel.

use std::{
    collections::HashMap,
    io::{self, BufRead},
    thread,
};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    state::game::{Category, HostAction, InputEvent, VoteAction},
};

const ESCAPE: char = '\u{1b}';

/// Maps key characters to input events.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: HashMap<char, InputEvent>,
}

impl KeyMap {
    /// Build the map from configured player and host keys. Player bindings win on conflicts.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut bindings = HashMap::new();
        let host = config.host_keys();
        for (key, action) in [
            (host.pause, HostAction::Pause),
            (host.skip, HostAction::Skip),
            (host.quit, HostAction::Quit),
            (ESCAPE, HostAction::Quit),
        ] {
            bindings.insert(key.to_ascii_lowercase(), InputEvent::Host(action));
        }

        for (player_index, seat) in config.players().iter().enumerate() {
            for (key, choice) in [
                (seat.keys.silicon, Category::Silicon),
                (seat.keys.soul, Category::Soul),
            ] {
                let previous = bindings.insert(
                    key.to_ascii_lowercase(),
                    InputEvent::Vote(VoteAction {
                        player_index,
                        choice,
                    }),
                );
                if let Some(InputEvent::Host(action)) = previous {
                    warn!(%key, ?action, player_index, "player key shadows a host key");
                }
            }
        }

        Self { bindings }
    }

    /// Event bound to `key`, case-insensitively.
    pub fn lookup(&self, key: char) -> Option<InputEvent> {
        self.bindings.get(&key.to_ascii_lowercase()).copied()
    }

    /// Events for every bound character of a line, in order.
    pub fn translate_line(&self, line: &str) -> Vec<InputEvent> {
        line.chars().filter_map(|key| self.lookup(key)).collect()
    }
}

/// Spawn a detached thread reading stdin line by line and forwarding mapped keys to the
/// console channel. It stops at EOF or once the game loop has dropped its receiver.
pub fn spawn_stdin_reader(
    keymap: KeyMap,
    console: mpsc::UnboundedSender<InputEvent>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            info!("keyboard input enabled; type keys then press enter");
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "failed to read stdin; keyboard reader stops");
                        return;
                    }
                };
                for event in keymap.translate_line(&line) {
                    debug!(?event, "key mapped");
                    if console.send(event).is_err() {
                        return;
                    }
                }
            }
            debug!("stdin closed; keyboard reader stops");
        })
}
