// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy for the print strategy chain.
//
// Attempts are categorically different commands rather than repeats of one
// request, so the delay is fixed and there is no jitter.  The attempt budget
// equals the number of strategies.

use std::time::Duration;

use photobooth_core::config::PrintTiming;
use tracing::{debug, warn};

/// Retry configuration for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (one per strategy).
    pub max_attempts: u32,
    /// Fixed pause after a failed attempt, letting the spooler settle.
    pub delay: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_strategies(4, PrintTiming::default())
    }
}

/// Result of evaluating whether to try the next strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Advance to the next strategy after this delay.
    RetryAfter(Duration),
    /// Every strategy has been tried.
    Exhausted,
}

impl RetryPolicy {
    /// Policy covering `count` strategies with the configured timing.
    pub fn for_strategies(count: usize, timing: PrintTiming) -> Self {
        Self {
            max_attempts: u32::try_from(count).unwrap_or(u32::MAX),
            delay: timing.strategy_delay,
            attempt_timeout: timing.strategy_timeout,
        }
    }

    /// Decide what happens after `attempts_made` attempts have all failed.
    pub fn after_failure(&self, attempts_made: u32) -> RetryDecision {
        if attempts_made >= self.max_attempts {
            warn!(
                attempts_made,
                max = self.max_attempts,
                "print strategies exhausted"
            );
            RetryDecision::Exhausted
        } else {
            debug!(
                attempts_made,
                delay_ms = self.delay.as_millis(),
                "advancing to next print strategy"
            );
            RetryDecision::RetryAfter(self.delay)
        }
    }
}
