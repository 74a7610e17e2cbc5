//! Idle detection with exponential backoff.
//!
//! The controller waits on the shared activity interrupt with the idle timer
//! as deadline. Activity resets the idle timer and marks everyone present;
//! reaching the deadline marks everyone away.
//!
//! Activity that lands close to an idle deadline (inside the backoff window)
//! multiplies the next idle timeout by the backoff factor, so a user hovering
//! around the threshold does not flip the away status over and over. The
//! exponent decays by one per decay period, checked only when activity
//! arrives.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::interrupt::Interrupt;
use crate::timer::{Timer, TimerStart};

/// Something whose away status the idle controller drives.
#[async_trait]
pub trait AwayStatus: Send + Sync {
    async fn set_away(&self, away: bool);
}

#[async_trait]
impl<T: AwayStatus + ?Sized> AwayStatus for Arc<T> {
    async fn set_away(&self, away: bool) {
        (**self).set_away(away).await
    }
}

#[derive(Debug, Error)]
pub enum IdleError {
    /// Woke up without activity and without reaching the deadline.
    #[error("woke up before the idle deadline without activity: {idle_timer}")]
    Inconsistent { idle_timer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffParams {
    /// Idle timeout at backoff exponent zero.
    pub idle_timeout: Duration,
    pub factor: f64,
    pub max_exp: u32,
    /// Width of the backoff window as a fraction of the idle timeout.
    pub deadzone: f64,
    /// How long without a decay step before the exponent drops by one.
    pub decay: Duration,
}

impl BackoffParams {
    /// Largest exponent keeping `idle_timeout * factor^exp` within `max_timeout`.
    pub fn max_exp_for(idle_timeout: Duration, factor: f64, max_timeout: Duration) -> u32 {
        let ratio = max_timeout.as_secs_f64() / idle_timeout.as_secs_f64();
        if factor <= 1.0 || !ratio.is_finite() || ratio < 1.0 {
            return 0;
        }
        // Nudge so exact powers are not lost to rounding
        (ratio.ln() / factor.ln() + 1e-9).floor() as u32
    }

    /// Idle timeout at backoff exponent `exp`.
    pub fn idle_duration(&self, exp: u32) -> Duration {
        let exp = i32::try_from(exp).unwrap_or(i32::MAX);
        scale(self.idle_timeout, self.factor.powi(exp))
    }
}

impl Default for BackoffParams {
    fn default() -> Self {
        let idle_timeout = Duration::from_secs(5 * 60);
        let factor = 2.0;
        Self {
            idle_timeout,
            factor,
            max_exp: Self::max_exp_for(idle_timeout, factor, Duration::from_secs(3600)),
            deadzone: 1.0,
            decay: Duration::from_secs(24 * 3600),
        }
    }
}

fn scale(duration: Duration, by: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * by).unwrap_or(Duration::MAX)
}

/// What the controller decided after waking up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Activity seen, mark present.
    Active,
    /// Idle timeout reached, mark away.
    Idle,
}

impl Transition {
    pub fn away(self) -> bool {
        matches!(self, Transition::Idle)
    }
}

/// Backoff exponent and timers, replaced on every transition.
#[derive(Debug, Clone)]
pub struct IdleState {
    backoff_exp: u32,
    idle_timer: Timer,
    backoff_timer: Timer,
    decay_timer: Timer,
}

impl IdleState {
    pub fn new(params: &BackoffParams) -> Self {
        let idle_timer = Timer::start_now(params.idle_duration(0));
        Self {
            backoff_exp: 0,
            backoff_timer: backoff_window(&idle_timer, params.deadzone),
            idle_timer,
            decay_timer: Timer::start_now(params.decay),
        }
    }

    pub fn backoff_exp(&self) -> u32 {
        self.backoff_exp
    }

    pub fn idle_timer(&self) -> &Timer {
        &self.idle_timer
    }

    pub fn backoff_timer(&self) -> &Timer {
        &self.backoff_timer
    }

    pub fn decay_timer(&self) -> &Timer {
        &self.decay_timer
    }

    /// Advance the state machine after a wait that was (or was not) cut
    /// short by activity.
    pub fn step(
        &mut self,
        params: &BackoffParams,
        interrupted: bool,
    ) -> Result<Transition, IdleError> {
        if interrupted {
            if self.backoff_timer.is_running() {
                self.backoff_exp = (self.backoff_exp + 1).min(params.max_exp);
            }
            if self.decay_timer.is_expired() {
                self.backoff_exp = self.backoff_exp.saturating_sub(1);
                self.decay_timer = Timer::start_now(params.decay);
            }
            debug!(backoff_exp = self.backoff_exp, "backoff updated");

            self.idle_timer = Timer::start_now(params.idle_duration(self.backoff_exp));
            self.backoff_timer = backoff_window(&self.idle_timer, params.deadzone);
            Ok(Transition::Active)
        } else if self.idle_timer.is_expired() {
            self.idle_timer = Timer::never();
            Ok(Transition::Idle)
        } else {
            Err(IdleError::Inconsistent {
                idle_timer: self.idle_timer.to_string(),
            })
        }
    }
}

/// Window of `deadzone * duration` centered on the idle timer's deadline.
fn backoff_window(idle_timer: &Timer, deadzone: f64) -> Timer {
    let (Some(duration), Some(expires)) = (idle_timer.duration(), idle_timer.expires()) else {
        // No deadline, no window
        return Timer::new(Duration::ZERO, TimerStart::At(idle_timer.started_at()));
    };
    let width = scale(duration, deadzone);
    let start = expires.checked_sub(width / 2).unwrap_or(idle_timer.started_at());
    Timer::new(width, TimerStart::At(start))
}

pub struct IdleController<S> {
    params: BackoffParams,
    state: IdleState,
    activity: Arc<Interrupt>,
    status: S,
}

impl<S: AwayStatus> IdleController<S> {
    pub fn new(params: BackoffParams, activity: Arc<Interrupt>, status: S) -> Self {
        Self {
            state: IdleState::new(&params),
            params,
            activity,
            status,
        }
    }

    pub fn state(&self) -> &IdleState {
        &self.state
    }

    /// Run until `cancel` fires. Only returns an error on an internal
    /// inconsistency, which the process cannot recover from.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), IdleError> {
        info!(
            idle_timeout = ?self.params.idle_timeout,
            factor = self.params.factor,
            max_exp = self.params.max_exp,
            "idle controller started"
        );

        loop {
            debug!(idle_timer = %self.state.idle_timer, "waiting for activity");

            let deadline = self.state.idle_timer.expires();
            let interrupted = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                interrupted = self.activity.wait_until(deadline) => interrupted,
            };

            debug!(
                interrupted,
                idle_timer = %self.state.idle_timer,
                backoff_timer = %self.state.backoff_timer,
                decay_timer = %self.state.decay_timer,
                "woke up"
            );

            let transition = self.state.step(&self.params, interrupted)?;
            if transition == Transition::Idle {
                info!("idle timeout reached");
            }
            self.status.set_away(transition.away()).await;
        }
    }
}
