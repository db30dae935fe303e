// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::Error;
use crate::sweep::Sweeper;

/// Handle to a producer's pending-or-resolved result. Awaiting it yields a clone of
/// the eventual outcome, whether or not the producer has settled yet.
type ResultHandle<V, E> = Shared<BoxFuture<'static, Result<V, Error<E>>>>;

type EntryMap<K, V, E> = Mutex<HashMap<K, CacheEntry<V, E>>>;

/// A cached computation: the result handle plus the instant after which the entry is
/// no longer valid, regardless of whether the computation succeeded.
struct CacheEntry<V, E> {
    result: ResultHandle<V, E>,
    expires_at: Instant,
}

impl<V, E> CacheEntry<V, E> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Coalescing cache of asynchronous computations with per-entry time-to-live.
///
/// A lookup miss invokes the caller's producer exactly once and registers its pending
/// result under the key before awaiting it, so any number of concurrent lookups
/// racing before the producer settles share the single run. Entries are invalid once
/// their expiry instant passes; expired entries are ignored by reads and reclaimed by
/// [`purge_expired`][Self::purge_expired] or the background sweeper.
///
/// All map access happens under one short-lived mutex that is never held across an
/// `await`, which makes the miss check and registration a single atomic step and
/// keeps removals safe to run concurrently with lookups.
pub struct PromiseCache<K, V, E> {
    entries: Arc<EntryMap<K, V, E>>,
    default_ttl: Duration,
    sweeper: Sweeper,
}

impl<K, V, E> fmt::Debug for PromiseCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseCache")
            .field("entries", &self.entries.lock().len())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V, E> PromiseCache<K, V, E>
where
    K: Hash + Eq + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates an empty cache whose entries live for `default_ttl` unless a lookup
    /// specifies otherwise via [`get_with_ttl`][Self::get_with_ttl].
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
            sweeper: Sweeper::default(),
        }
    }

    /// Returns the cached result for `key`, invoking `producer` on a miss.
    ///
    /// If a live entry exists, its result is awaited and returned and `producer` is
    /// not invoked, even if the underlying computation is still in flight. Otherwise
    /// `producer` is invoked exactly once, its future is spawned onto the current
    /// runtime, and the pending result is registered under `key` with
    /// `expiry = now + default_ttl` before anything is awaited. Concurrent lookups
    /// arriving before the producer settles all receive the same outcome.
    ///
    /// The producer is never cancelled by the cache: if every interested caller is
    /// dropped, the spawned task still runs to completion and its result stays
    /// cached for later lookups until the entry expires.
    ///
    /// A failed producer is cached like a successful one; see [`Error::Producer`].
    pub async fn get<F, Fut>(&self, key: K, producer: F) -> Result<V, Error<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.get_with_ttl(key, producer, self.default_ttl).await
    }

    /// Like [`get`][Self::get], but a fresh entry lives for `ttl` instead of the
    /// cache-wide default.
    pub async fn get_with_ttl<F, Fut>(&self, key: K, producer: F, ttl: Duration) -> Result<V, Error<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let result = {
            let now = Instant::now();
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(entry) if entry.is_live(now) => {
                    trace!("hit, reusing stored result");
                    entry.result.clone()
                }
                _ => {
                    debug!("miss, invoking producer");
                    let result = spawn_producer(producer());
                    entries.insert(
                        key,
                        CacheEntry {
                            result: result.clone(),
                            expires_at: now + ttl,
                        },
                    );
                    result
                }
            }
        };

        result.await
    }

    /// Removes the entry for `key` unconditionally, expired or not, pending or
    /// settled. Returns whether an entry was removed.
    ///
    /// An in-flight producer keeps running; only the mapping is dropped, so the next
    /// lookup for `key` misses and starts a fresh run.
    pub fn remove(&self, key: &K) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns whether a live (non-expired) entry exists for `key`.
    ///
    /// Expiry is evaluated lazily: an expired entry that no sweep has removed yet
    /// reads as absent. Does not mutate the cache.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.entries.lock().get(key).is_some_and(|entry| entry.is_live(now))
    }

    /// Returns the raw entry count, *including* logically expired entries that no
    /// sweep has removed yet. Treat it as an approximation of the live count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns whether the cache holds no entries at all, expired or not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Resets the expiry of the entry for `key` to `now + ttl`, regardless of
    /// whether its computation is pending, settled, or already logically expired.
    /// Returns false if no entry exists.
    pub fn set_ttl(&self, key: &K, ttl: Duration) -> bool {
        match self.entries.lock().get_mut(key) {
            Some(entry) => {
                entry.expires_at = Instant::now() + ttl;
                true
            }
            None => false,
        }
    }

    /// Removes every expired entry and returns how many were removed.
    ///
    /// Safe to call concurrently with lookups and removals; the scan holds the map
    /// mutex for its duration and nothing else.
    pub fn purge_expired(&self) -> usize {
        let removed = purge(&self.entries);
        if removed > 0 {
            debug!(removed, "purged expired entries");
        }
        removed
    }

    /// Starts a background task that calls [`purge_expired`][Self::purge_expired]
    /// once per `interval`.
    ///
    /// At most one sweeper runs per cache: starting while one is already running
    /// replaces the previous schedule. The task holds only a weak reference to the
    /// entry map, and it is aborted when the cache is dropped or
    /// [`stop_sweeper`][Self::stop_sweeper] is called.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_sweeper(&self, interval: Duration) {
        let entries = Arc::downgrade(&self.entries);
        self.sweeper.start(interval, move || {
            entries.upgrade().map(|entries| {
                let removed = purge(&entries);
                if removed > 0 {
                    debug!(removed, "sweeper removed expired entries");
                }
                removed
            })
        });
    }

    /// Stops the background sweeper. A no-op if none is running.
    pub fn stop_sweeper(&self) {
        self.sweeper.stop();
    }
}

fn purge<K, V, E>(entries: &EntryMap<K, V, E>) -> usize
where
    K: Hash + Eq,
{
    let now = Instant::now();
    let mut map = entries.lock();
    let before = map.len();
    map.retain(|_, entry| entry.is_live(now));
    before - map.len()
}

/// Spawns the producer's future and wraps its join handle in a shareable result.
///
/// Spawning (rather than storing the future lazily) is what lets the computation
/// settle even when every caller abandons interest before it completes.
fn spawn_producer<V, E, Fut>(future: Fut) -> ResultHandle<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    let handle = tokio::spawn(future);
    let settled: BoxFuture<'static, Result<V, Error<E>>> = Box::pin(async move {
        match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Error::Producer(Arc::new(err))),
            Err(_) => Err(Error::Lost),
        }
    });
    settled.shared()
}

#[cfg(test)]
mod tests {
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PromiseCache<String, String, io::Error>: Send, Sync, fmt::Debug);
    assert_impl_all!(Error<io::Error>: Send, Sync, Clone, fmt::Debug);

    #[tokio::test]
    async fn debug_impl() {
        let cache: PromiseCache<&str, u32, io::Error> = PromiseCache::new(Duration::from_secs(60));
        let _ = cache.get("k", || async { Ok(1) }).await;

        let rendered = format!("{cache:?}");
        assert!(rendered.contains("PromiseCache"));
        assert!(rendered.contains("entries: 1"));
    }
}
