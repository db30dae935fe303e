// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Time-bounded cache for asynchronous computations.
//!
//! This crate provides [`PromiseCache`], a cache that stores promises of values rather
//! than values: the pending result of a producer is registered under its key *before*
//! it settles, so concurrent requests for the same key collapse into a single producer
//! run, and every caller receives the same eventual success or failure. Entries expire
//! after a time-to-live, either lazily on lookup or eagerly through an optional
//! background sweeper.
//!
//! # When to Use
//!
//! Use `PromiseCache` when an expensive async operation may be requested repeatedly
//! and concurrently for the same logical resource:
//!
//! - **API calls**: one in-flight fetch per endpoint, shared by all interested callers
//! - **Database queries**: identical queries issued in a burst hit the database once
//! - **Derived data**: expensive computations whose results stay valid for a bounded time
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use promissory::PromiseCache;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: PromiseCache<&str, String, std::io::Error> = PromiseCache::new(Duration::from_secs(300));
//!
//! let value = cache
//!     .get("greeting", || async { Ok("hello".to_string()) })
//!     .await
//!     .unwrap();
//! assert_eq!(value, "hello");
//!
//! // A second lookup inside the TTL window reuses the stored result; the
//! // producer is not invoked.
//! let again = cache
//!     .get("greeting", || async { unreachable!() })
//!     .await
//!     .unwrap();
//! assert_eq!(again, "hello");
//! # }
//! ```
//!
//! # Failure Caching
//!
//! A producer that settles with an error is cached the same way as one that succeeds:
//! repeated lookups inside the TTL window return the stored [`Error::Producer`] without
//! re-invoking the producer. This is a deliberate policy, not a bug. Callers that want
//! retry semantics compose their producer with a retry decorator (such as the
//! `mulligan` crate) before handing it to the cache, or call
//! [`remove`][PromiseCache::remove] after observing a failure.
//!
//! # Expiry
//!
//! The TTL bounds *cache validity*, not producer execution time. A logically expired
//! entry is treated as absent by [`get`][PromiseCache::get] and
//! [`contains`][PromiseCache::contains] even before any sweep removes it. The
//! background sweeper started by [`start_sweeper`][PromiseCache::start_sweeper] only
//! reclaims the memory sooner.

mod cache;
mod error;
mod sweep;

pub use cache::PromiseCache;
pub use error::Error;
