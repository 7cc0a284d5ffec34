use std::{fmt, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The two answers a player can lock in, doubling as the ground-truth label of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    /// Track produced by an AI.
    Silicon,
    /// Track produced by a human.
    Soul,
}

impl Category {
    /// Label used by the round log `category` field.
    pub fn log_label(self) -> &'static str {
        match self {
            Category::Silicon => "ai",
            Category::Soul => "human",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Silicon => f.write_str("Silicon"),
            Category::Soul => f.write_str("Soul"),
        }
    }
}

/// Immutable track handed out by the song selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Location of the audio file.
    pub path: PathBuf,
    /// Ground-truth category used to check votes.
    pub category: Category,
}

impl Track {
    /// Build a track from a path and its category.
    pub fn new(path: impl Into<PathBuf>, category: Category) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }
}

/// A vote locked in for the current round, timestamped in effective time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedVote {
    /// Chosen category.
    pub choice: Category,
    /// Effective time at which the vote was accepted.
    pub at: Duration,
}

/// Score tween seeded by the match when points change; interpolation belongs to presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAnimation {
    /// Effective time at which the tween starts.
    pub start: Duration,
    /// Displayed value at the start of the tween.
    pub from: f64,
    /// Displayed value at the end of the tween.
    pub to: f64,
}

/// Player info tracked during a match.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Stable index of the player (0-based).
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Cumulative score for the match, may go negative.
    pub score: i32,
    /// Set once at match end for every player tied at the top score.
    pub is_champion: bool,
    /// Vote locked in this round, if any.
    pub vote: Option<LockedVote>,
    /// Signed points awarded or deducted this round.
    pub points_delta: i32,
    /// True when the vote matched the round's category.
    pub is_winner: bool,
    /// Last score value shown on screen.
    pub display_score: f64,
    /// Pending score tween, if any.
    pub score_animation: Option<ScoreAnimation>,
}

impl Player {
    /// Create a player with blank per-match and per-round state.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            score: 0,
            is_champion: false,
            vote: None,
            points_delta: 0,
            is_winner: false,
            display_score: 0.0,
            score_animation: None,
        }
    }

    /// Whether the player already locked in a vote this round.
    pub fn has_voted(&self) -> bool {
        self.vote.is_some()
    }

    /// Chosen category this round, if any.
    pub fn choice(&self) -> Option<Category> {
        self.vote.map(|vote| vote.choice)
    }

    pub(crate) fn reset_round(&mut self) {
        self.vote = None;
        self.points_delta = 0;
        self.is_winner = false;
        // Any tween seeded at the previous reveal has finished by now.
        self.score_animation = None;
        self.display_score = f64::from(self.score);
    }

    pub(crate) fn reset_match(&mut self) {
        self.score = 0;
        self.is_champion = false;
        self.display_score = 0.0;
        self.score_animation = None;
        self.reset_round();
    }
}

/// Discrete vote produced by the keyboard map or a hardware controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteAction {
    /// Index of the voting player.
    pub player_index: usize,
    /// Chosen category.
    pub choice: Category,
}

/// Host commands accepted from the keyboard or the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HostAction {
    /// Toggle pause.
    Pause,
    /// End the current round now (or reset the match once it is over).
    Skip,
    /// Stop the show.
    Quit,
}

/// Input event consumed by the game loop once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Player vote.
    Vote(VoteAction),
    /// Host command.
    Host(HostAction),
}

impl From<VoteAction> for InputEvent {
    fn from(value: VoteAction) -> Self {
        InputEvent::Vote(value)
    }
}

impl From<HostAction> for InputEvent {
    fn from(value: HostAction) -> Self {
        InputEvent::Host(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_reset_clears_vote_but_keeps_score() {
        let mut player = Player::new(0, "Ada");
        player.score = 4;
        player.points_delta = 2;
        player.is_winner = true;
        player.vote = Some(LockedVote {
            choice: Category::Soul,
            at: Duration::from_secs(3),
        });

        player.reset_round();

        assert_eq!(player.score, 4);
        assert_eq!(player.points_delta, 0);
        assert!(!player.is_winner);
        assert!(!player.has_voted());
        assert_eq!(player.display_score, 4.0);
    }

    #[test]
    fn match_reset_zeroes_score_and_champion_flag() {
        let mut player = Player::new(1, "Bob");
        player.score = -2;
        player.is_champion = true;

        player.reset_match();

        assert_eq!(player.score, 0);
        assert!(!player.is_champion);
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::Silicon.log_label(), "ai");
        assert_eq!(Category::Soul.log_label(), "human");
        assert_eq!(Category::Soul.to_string(), "Soul");
    }
}
