// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

/// Failure channel of a cached computation.
///
/// Every caller coalesced onto the same producer run observes the same error value,
/// which is why the underlying error is held behind an [`Arc`] rather than requiring
/// `E: Clone`.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The producer settled with a failure.
    ///
    /// The failed result stays cached under its key until the entry expires or is
    /// removed, so repeated lookups inside the TTL window return this same error
    /// without re-invoking the producer.
    #[error("producer failed: {0}")]
    Producer(Arc<E>),

    /// The producer task panicked or its runtime shut down before it settled.
    #[error("producer task was lost before it settled")]
    Lost,
}

impl<E> Error<E> {
    /// Returns the producer's error, if that is what happened.
    pub fn producer_error(&self) -> Option<&E> {
        match self {
            Self::Producer(err) => Some(err),
            Self::Lost => None,
        }
    }
}

// Manual impl: a derived `Clone` would demand `E: Clone`, which defeats the
// purpose of the `Arc`.
impl<E> Clone for Error<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Producer(err) => Self::Producer(Arc::clone(err)),
            Self::Lost => Self::Lost,
        }
    }
}
