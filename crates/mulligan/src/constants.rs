// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Default total attempt budget: 5.
///
/// Generous enough to ride out short-lived outages without holding a caller
/// hostage for long; the exponential schedule means the fifth attempt already
/// sits behind roughly fifteen seconds of accumulated delay at the default
/// base delay.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first retry: 1 second.
///
/// Long enough for most transient conditions (connection resets, brief
/// contention) to clear, short enough that an interactive caller barely
/// notices a single retry.
pub(crate) const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default backoff multiplier: 2.
///
/// Doubling is the conventional choice for transient faults: it backs off
/// aggressively enough to shed load during an outage while keeping early
/// retries prompt.
pub(crate) const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default jitter band: 0.5, i.e. each delay is randomized within ±25%.
///
/// Desynchronizes callers that failed at the same moment so their retries do
/// not arrive as a correlated burst. See
/// [Exponential Backoff and Jitter](https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter)
/// for background.
pub(crate) const DEFAULT_JITTER_FACTOR: f64 = 0.5;
