//! Business logic powering the admin REST routes. Every action is enqueued on the console
//! channel and applied by the game loop at its next tick.

use tracing::debug;

use crate::{
    dto::admin::{ActionResponse, VoteRequest},
    error::ServiceError,
    state::{
        SharedState,
        game::{HostAction, InputEvent, VoteAction},
    },
};

/// Queue a host action.
pub fn host_action(state: &SharedState, action: HostAction) -> Result<ActionResponse, ServiceError> {
    enqueue(state, action.into())?;
    debug!(?action, "host action queued");
    Ok(ActionResponse {
        message: format!("{} queued", describe(action)),
    })
}

/// Queue a vote on behalf of a player.
pub fn cast_vote(state: &SharedState, request: VoteRequest) -> Result<ActionResponse, ServiceError> {
    let player_count = state.config().players().len();
    let player_index = request
        .player_index()
        .filter(|index| *index < player_count)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{}` not found", request.player)))?;

    enqueue(
        state,
        VoteAction {
            player_index,
            choice: request.choice.into(),
        }
        .into(),
    )?;
    debug!(player_index, "admin vote queued");
    Ok(ActionResponse {
        message: format!("vote for {} queued", request.player),
    })
}

fn enqueue(state: &SharedState, event: InputEvent) -> Result<(), ServiceError> {
    if state.is_shutting_down() || !state.send_console(event) {
        return Err(ServiceError::InvalidState("game loop is shutting down".into()));
    }
    Ok(())
}

fn describe(action: HostAction) -> &'static str {
    match action {
        HostAction::Pause => "pause toggle",
        HostAction::Skip => "skip",
        HostAction::Quit => "quit",
    }
}
