// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Retries async operations with exponential backoff and jitter.
//!
//! This crate provides [`Policy`], a stateless decorator for fallible async
//! operations. Each call to [`Policy::run`] is independent: the operation is invoked
//! up to a maximum number of attempts, with an exponentially growing, jittered delay
//! between failures. The terminal failure wraps the last underlying error together
//! with the attempt count; every earlier failure is logged as a retry event and
//! swallowed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use mulligan::Policy;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = Policy::default()
//!     .max_attempts(3)
//!     .base_delay(Duration::from_millis(200));
//!
//! let result: Result<&str, _> = policy.run(|| async { Ok::<_, String>("fetched") }).await;
//! assert_eq!(result.unwrap(), "fetched");
//! # }
//! ```
//!
//! # Delay Schedule
//!
//! The pre-jitter delay after the n-th failed attempt is
//! `base_delay * backoff_factor^(n-1)`. Jitter then spreads each delay uniformly
//! over `[delay * (1 - jitter_factor / 2), delay * (1 + jitter_factor / 2)]`, so
//! with the default factors of 2.0 and 0.5 the schedule is 1s, 2s, 4s, ... with
//! each delay randomized within ±25%.
//!
//! # Scope
//!
//! The wait between attempts is a plain timed suspension: it is not cancellable
//! mid-wait and no overall deadline is imposed. Decide recoverability before
//! reaching for this crate; an operation that fails permanently will simply fail
//! `max_attempts` times.

use std::fmt::Display;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

mod backoff;
mod constants;
mod error;
mod rnd;

pub use error::RetryError;

use crate::backoff::Schedule;
use crate::rnd::Rnd;

/// Retry policy: attempt budget plus backoff shape.
///
/// A policy carries no state between runs; it can be cloned freely and shared
/// across tasks. Construct one with [`Policy::default`] and adjust it with the
/// builder methods.
#[derive(Debug, Clone)]
pub struct Policy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
    jitter_factor: f64,
    rnd: Rnd,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: constants::DEFAULT_BASE_DELAY,
            backoff_factor: constants::DEFAULT_BACKOFF_FACTOR,
            jitter_factor: constants::DEFAULT_JITTER_FACTOR,
            rnd: Rnd::default(),
        }
    }
}

impl Policy {
    /// Sets the total number of attempts, including the first one.
    ///
    /// A value of zero is treated as one: the operation always runs at least once.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry; later delays grow from it.
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the multiplier applied to the delay after each failed attempt.
    #[must_use]
    pub fn backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Sets the width of the jitter band around each delay.
    ///
    /// A factor of `j` spreads a delay uniformly over `±(j / 2)` of its pre-jitter
    /// value; zero disables jitter entirely.
    #[must_use]
    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Runs `operation` until it succeeds or the attempt budget is exhausted.
    ///
    /// Success returns immediately with the operation's value. A failure on the
    /// final attempt returns a [`RetryError`] wrapping the last underlying error;
    /// any earlier failure is logged and followed by a jittered backoff delay
    /// before the next attempt.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut delays = self.delays();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    debug!(attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(err) if attempt >= max_attempts => {
                    warn!(attempt, error = %err, "final attempt failed, giving up");
                    return Err(RetryError::new(attempt, max_attempts, err));
                }
                Err(err) => {
                    let delay = delays.next().unwrap_or(Duration::ZERO);
                    warn!(attempt, ?delay, error = %err, "attempt failed, retrying");
                    time::sleep(delay).await;
                }
            }
        }
    }

    /// The jittered delay schedule this policy produces, one entry per retry.
    fn delays(&self) -> Schedule {
        Schedule::new(self.base_delay, self.backoff_factor, self.jitter_factor, self.rnd.clone())
    }
}

/// Runs `operation` under the default [`Policy`].
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    Policy::default().run(operation).await
}
