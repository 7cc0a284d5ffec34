//! Service helpers that expose read-only public projections of the running match.

use crate::{
    dto::{common::GameSnapshot, public::PlayersResponse},
    state::SharedState,
};

/// Latest snapshot published by the game loop.
pub fn current_state(state: &SharedState) -> GameSnapshot {
    state.snapshot()
}

/// Player summaries as shown on the scoreboard.
pub fn players(state: &SharedState) -> PlayersResponse {
    PlayersResponse {
        players: state.snapshot().players,
    }
}
