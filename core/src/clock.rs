use core::time::Duration;
use web_time::Instant;

/// Monotonic stopwatch for a single game.
///
/// Elapsed time is always `end - start`, never an accumulated tick count, so a
/// throttled or late timer can only delay the display and not skew the score.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ElapsedClock {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl ElapsedClock {
    pub const fn new() -> Self {
        Self {
            started_at: None,
            stopped_at: None,
        }
    }

    /// Starts the clock; has no effect once it was started.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            log::debug!("clock started");
            self.started_at = Some(now);
        }
    }

    /// Freezes the elapsed time; has no effect unless running.
    pub fn stop(&mut self, now: Instant) {
        if self.is_running() {
            self.stopped_at = Some(now);
            log::debug!("clock stopped after {:?}", self.elapsed(now));
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) => self
                .stopped_at
                .unwrap_or(now)
                .saturating_duration_since(started_at),
            None => Duration::ZERO,
        }
    }

    /// Unrounded seconds, see [`round_centis`] for display and scoring.
    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.elapsed(now).as_secs_f64()
    }
}

/// Rounds seconds to two decimals.
pub fn round_centis(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
