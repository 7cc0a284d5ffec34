use std::time::Duration;

/// Pause bookkeeping turning wall-clock readings into effective time.
///
/// Timestamps are offsets on the host's monotonic clock. Effective time is the wall-clock
/// reading minus every paused span; it freezes while paused, so deadlines kept in effective
/// time shift by exactly the paused duration without being rescheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseClock {
    paused_total: Duration,
    paused_since: Option<Duration>,
}

impl PauseClock {
    /// Whether the clock is currently frozen.
    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Total paused time accumulated by completed pauses.
    pub fn paused_total(&self) -> Duration {
        self.paused_total
    }

    /// Effective time for a wall-clock reading.
    pub fn effective(&self, now: Duration) -> Duration {
        let reference = match self.paused_since {
            Some(since) => since.min(now),
            None => now,
        };
        reference.saturating_sub(self.paused_total)
    }

    /// Wall-clock reading of an effective instant, given the pauses completed so far.
    pub fn to_wall(&self, effective: Duration) -> Duration {
        effective + self.paused_total
    }

    /// Freeze effective time at `now`. Returns false when already paused.
    pub fn pause(&mut self, now: Duration) -> bool {
        if self.paused_since.is_some() {
            return false;
        }
        self.paused_since = Some(now);
        true
    }

    /// Resume at `now`, accumulating the paused span. Returns the span, or `None` when the
    /// clock was running.
    pub fn resume(&mut self, now: Duration) -> Option<Duration> {
        let since = self.paused_since.take()?;
        let delta = now.saturating_sub(since);
        self.paused_total += delta;
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn running_clock_tracks_wall_time() {
        let clock = PauseClock::default();
        assert_eq!(clock.effective(secs(12.5)), secs(12.5));
    }

    #[test]
    fn paused_clock_freezes_and_resume_accumulates() {
        let mut clock = PauseClock::default();
        assert!(clock.pause(secs(10.0)));
        assert!(!clock.pause(secs(11.0)));
        assert_eq!(clock.effective(secs(14.0)), secs(10.0));

        assert_eq!(clock.resume(secs(17.0)), Some(secs(7.0)));
        assert_eq!(clock.effective(secs(17.0)), secs(10.0));
        assert_eq!(clock.effective(secs(18.0)), secs(11.0));
        assert_eq!(clock.to_wall(secs(11.0)), secs(18.0));
    }

    #[test]
    fn resume_without_pause_is_ignored() {
        let mut clock = PauseClock::default();
        assert_eq!(clock.resume(secs(3.0)), None);
        assert_eq!(clock.paused_total(), Duration::ZERO);
    }
}
