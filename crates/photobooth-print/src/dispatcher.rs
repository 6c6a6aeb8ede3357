// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print command dispatcher: walks the strategy chain in order until one
// strategy reaches the spooler or every strategy has failed.
//
// Strategies are never raced.  A failed attempt is followed by the policy's
// fixed delay because a half-finished job from the previous command can
// otherwise still be holding the spooler.  The dispatcher only reads the
// spool file; removing it is the caller's responsibility.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use photobooth_core::config::PrintTiming;
use photobooth_core::error::{PhotoboothError, Result};

use crate::retry::{RetryDecision, RetryPolicy};
use crate::strategy::{PrintStrategy, default_strategies};

/// Which strategy succeeded, and where the job went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSuccess {
    pub strategy: &'static str,
    pub printer: String,
    /// Number of strategies invoked, including the successful one.
    pub attempts: u32,
}

/// Ordered strategy chain plus the policy that paces it.
pub struct Dispatcher {
    strategies: Vec<Arc<dyn PrintStrategy>>,
    policy: RetryPolicy,
}

impl Dispatcher {
    /// Build a dispatcher whose attempt budget equals the strategy count.
    pub fn new(strategies: Vec<Arc<dyn PrintStrategy>>, timing: PrintTiming) -> Self {
        let policy = RetryPolicy::for_strategies(strategies.len(), timing);
        Self { strategies, policy }
    }

    /// The host's default strategy chain.
    pub fn for_host(timing: PrintTiming) -> Self {
        Self::new(default_strategies(), timing)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Identifiers of the configured strategies, in attempt order.
    pub fn strategy_ids(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    /// Print `file` on `printer`, trying each strategy in turn.
    ///
    /// Returns [`PhotoboothError::AllMethodsFailed`] carrying the last
    /// strategy's error once the chain is exhausted.
    #[instrument(skip_all, fields(printer = %printer, file = %file.display()))]
    pub async fn print(&self, file: &Path, printer: &str) -> Result<DispatchSuccess> {
        let mut last_error = String::from("no print strategies configured");
        let mut attempts: u32 = 0;

        for strategy in &self.strategies {
            if attempts >= self.policy.max_attempts {
                break;
            }
            attempts += 1;
            info!(strategy = strategy.id(), attempt = attempts, "trying print strategy");

            match strategy
                .attempt(file, printer, self.policy.attempt_timeout)
                .await
            {
                Ok(()) => {
                    info!(strategy = strategy.id(), attempts, "print job sent");
                    return Ok(DispatchSuccess {
                        strategy: strategy.id(),
                        printer: printer.to_owned(),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(strategy = strategy.id(), error = %e, "print strategy failed");
                    last_error = e.to_string();
                }
            }

            match self.policy.after_failure(attempts) {
                RetryDecision::RetryAfter(delay) => tokio::time::sleep(delay).await,
                RetryDecision::Exhausted => break,
            }
        }

        Err(PhotoboothError::AllMethodsFailed {
            last_error,
            printer: printer.to_owned(),
        })
    }
}
