// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::rnd::Rnd;

/// Infinite iterator over the jittered backoff schedule.
///
/// The n-th entry (0-based) is `base_delay * backoff_factor^n` with jitter applied.
#[derive(Debug)]
pub(crate) struct Schedule {
    base_delay: Duration,
    backoff_factor: f64,
    jitter_factor: f64,
    rnd: Rnd,
    attempt: u32,
}

impl Schedule {
    pub(crate) fn new(base_delay: Duration, backoff_factor: f64, jitter_factor: f64, rnd: Rnd) -> Self {
        Self {
            base_delay,
            backoff_factor,
            jitter_factor,
            rnd,
            attempt: 0,
        }
    }
}

impl Iterator for Schedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        // zero base delay => always zero
        if self.base_delay.is_zero() {
            return Some(Duration::ZERO);
        }

        let exponent = i32::try_from(self.attempt).unwrap_or(i32::MAX);
        self.attempt = self.attempt.saturating_add(1);

        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Some(apply_jitter(delay, self.jitter_factor, &self.rnd))
    }
}

/// Spreads `delay` (in seconds) uniformly over a band centered on itself, so
/// concurrent retriers fan out instead of waking in lockstep.
///
/// A `jitter_factor` of `j` puts the result in
/// `[delay * (1 - j / 2), delay * (1 + j / 2)]`; the conversion back to
/// [`Duration`] clamps negative values to zero and saturates on overflow.
fn apply_jitter(delay: f64, jitter_factor: f64, rnd: &Rnd) -> Duration {
    let offset = (delay * jitter_factor) / 2.0;
    let jitter = (delay * jitter_factor).mul_add(rnd.next_f64(), -offset);

    secs_to_duration_saturating(delay + jitter)
}

fn secs_to_duration_saturating(secs: f64) -> Duration {
    if secs <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
