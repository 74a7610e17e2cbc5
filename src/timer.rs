//! Monotonic timers.
//!
//! A [`Timer`] is a start instant plus a duration. Timers are plain values:
//! state machines replace them rather than mutate them. Readings come from
//! the tokio clock so tests can pause and advance time.

use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::time::Instant;

/// Where a new timer starts relative to the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStart {
    /// Starts now.
    Now,
    /// Started this long ago. Negative values start in the future.
    Elapsed(TimeDelta),
    /// Starts this far in the future. Negative values started in the past.
    In(TimeDelta),
    /// Starts at an explicit instant.
    At(Instant),
}

/// A start instant and a duration, which may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    started_at: Instant,
    /// `None` never expires.
    duration: Option<Duration>,
}

impl Timer {
    /// Create a timer of `duration` starting as described by `start`.
    pub fn new(duration: Duration, start: TimerStart) -> Self {
        Self::build(Some(duration), start)
    }

    /// Create a timer of `duration` starting now.
    pub fn start_now(duration: Duration) -> Self {
        Self::new(duration, TimerStart::Now)
    }

    /// A timer that never expires.
    pub fn never() -> Self {
        Self::build(None, TimerStart::Now)
    }

    fn build(duration: Option<Duration>, start: TimerStart) -> Self {
        let now = Instant::now();
        let started_at = match start {
            TimerStart::Now => now,
            TimerStart::Elapsed(elapsed) => offset(now, -elapsed),
            TimerStart::In(starts_in) => offset(now, starts_in),
            TimerStart::At(at) => at,
        };
        Self {
            started_at,
            duration,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// The duration, or `None` for a timer that never expires.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The expiry instant, or `None` if the timer never expires.
    pub fn expires(&self) -> Option<Instant> {
        self.duration
            .and_then(|duration| self.started_at.checked_add(duration))
    }

    pub fn is_never(&self) -> bool {
        self.expires().is_none()
    }

    pub fn is_started(&self) -> bool {
        self.started_at <= Instant::now()
    }

    pub fn is_expired(&self) -> bool {
        self.expires().is_some_and(|expires| expires <= Instant::now())
    }

    /// Started and not yet expired.
    pub fn is_running(&self) -> bool {
        self.is_started() && !self.is_expired()
    }

    /// Time since the start; negative before the timer has started.
    pub fn elapsed(&self) -> TimeDelta {
        signed_between(self.started_at, Instant::now())
    }

    /// Time until expiry; negative once expired, `None` if never.
    pub fn remaining(&self) -> Option<TimeDelta> {
        self.expires()
            .map(|expires| signed_between(Instant::now(), expires))
    }

    /// Time until the start; the negation of [`Timer::elapsed`].
    pub fn starts_in(&self) -> TimeDelta {
        -self.elapsed()
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = match self.remaining() {
            Some(remaining) => format_delta(remaining),
            None => "never".to_string(),
        };
        if self.is_started() {
            write!(f, "Timer({remaining}, elapsed={})", format_delta(self.elapsed()))
        } else {
            write!(
                f,
                "Timer({remaining}, starts_in={})",
                format_delta(self.starts_in())
            )
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// `to - from` as a signed delta.
fn signed_between(from: Instant, to: Instant) -> TimeDelta {
    if to >= from {
        to_delta(to - from)
    } else {
        -to_delta(from - to)
    }
}

/// Shift an instant by a signed delta, saturating at the clock's range.
fn offset(instant: Instant, delta: TimeDelta) -> Instant {
    let magnitude = delta.abs().to_std().unwrap_or(Duration::MAX);
    if delta >= TimeDelta::zero() {
        instant.checked_add(magnitude).unwrap_or(instant)
    } else {
        instant.checked_sub(magnitude).unwrap_or(instant)
    }
}

fn format_delta(delta: TimeDelta) -> String {
    format!("{:.3}s", delta.num_milliseconds() as f64 / 1000.0)
}
