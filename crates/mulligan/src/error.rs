// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Terminal failure after the attempt budget is exhausted.
///
/// Wraps the error from the last attempt together with the attempt accounting, so
/// callers and logs can tell a first-try failure apart from one that survived a
/// full backoff schedule.
#[derive(Debug, thiserror::Error)]
#[error("operation failed after {attempts} of {max_attempts} attempts: {last_error}")]
pub struct RetryError<E> {
    attempts: u32,
    max_attempts: u32,
    last_error: E,
}

impl<E> RetryError<E> {
    pub(crate) fn new(attempts: u32, max_attempts: u32, last_error: E) -> Self {
        Self {
            attempts,
            max_attempts,
            last_error,
        }
    }

    /// How many attempts actually ran before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The attempt budget the policy allowed.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The error from the final attempt.
    pub fn last_error(&self) -> &E {
        &self.last_error
    }

    /// Consumes the wrapper, yielding the error from the final attempt.
    pub fn into_last_error(self) -> E {
        self.last_error
    }
}
