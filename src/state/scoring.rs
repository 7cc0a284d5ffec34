//! Speed-weighted scoring applied once per round at reveal time.

use std::time::Duration;

use serde::Deserialize;

use crate::state::game::{Category, LockedVote};

/// Tunables for the scoring curve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Points for a correct vote locked in at the very end of the window.
    pub min_points: i32,
    /// Points for a correct vote locked in instantly.
    pub max_points: i32,
    /// Curve exponent; values below 1 reward fast answers disproportionately.
    pub speed_exponent: f64,
    /// Points deducted for a wrong vote.
    pub wrong_penalty: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            min_points: 1,
            max_points: 3,
            speed_exponent: 0.5,
            wrong_penalty: 1,
        }
    }
}

impl ScoringRules {
    /// Points a correct vote is worth after `elapsed` out of a `timeout` voting window.
    ///
    /// The elapsed time is clamped to `[0, timeout]`; a non-positive timeout always yields the
    /// minimum.
    pub fn speed_points(&self, elapsed: Duration, timeout: Duration) -> i32 {
        if timeout.is_zero() {
            return self.min_points;
        }
        let progress = elapsed.min(timeout).as_secs_f64() / timeout.as_secs_f64();
        let curved = 1.0 - progress.powf(self.speed_exponent);
        let span = f64::from(self.max_points - self.min_points);
        (f64::from(self.min_points) + span * curved).round() as i32
    }

    /// Signed outcome for one player once the correct category is known.
    ///
    /// `voting_open` is the effective time the voting window opened.
    pub fn round_delta(
        &self,
        vote: Option<LockedVote>,
        correct: Category,
        voting_open: Duration,
        timeout: Duration,
    ) -> i32 {
        match vote {
            None => 0,
            Some(vote) if vote.choice == correct => {
                self.speed_points(vote.at.saturating_sub(voting_open), timeout)
            }
            Some(_) => -self.wrong_penalty,
        }
    }
}
