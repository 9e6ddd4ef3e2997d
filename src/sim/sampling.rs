//! Repeating sample timer for the control signal
//!
//! Fires once after a warm-up delay, then once per period. Each firing
//! schedules the next one from the time it fired, the same as a callback
//! that re-registers itself. Cancelling the token stops it for good.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct SamplingTimer {
    period: f64,
    next_due: f64,
    token: CancelToken,
}

impl SamplingTimer {
    /// Arm the timer at `now`; the first sample is due after `warmup`
    pub fn start(now: f64, warmup: f64, period: f64) -> Self {
        Self {
            period,
            next_due: now + warmup,
            token: CancelToken::new(),
        }
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn next_due(&self) -> f64 {
        self.next_due
    }

    /// Returns true if a sample should be taken at `now`
    pub fn poll(&mut self, now: f64) -> bool {
        if self.token.is_cancelled() || now < self.next_due {
            return false;
        }
        self.next_due = now + self.period;
        true
    }
}
