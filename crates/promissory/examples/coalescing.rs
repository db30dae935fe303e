// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coalescing Example
//!
//! Demonstrates how `PromiseCache` prevents the thundering-herd problem: many
//! concurrent cache misses for the same key result in a single backend call, and
//! the producer handed to the cache is itself wrapped in a retry policy so that
//! transient backend failures are absorbed before anything is cached.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mulligan::Policy;
use promissory::PromiseCache;

/// A slow, flaky backend that counts how many times it is called.
#[derive(Debug, Clone)]
struct FlakyBackend {
    calls: Arc<AtomicU32>,
}

impl FlakyBackend {
    async fn fetch(&self, key: &str) -> Result<String, String> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The first call fails to show the retry decorator at work.
        if call == 1 {
            return Err("transient backend hiccup".to_string());
        }
        Ok(format!("value_for_{key}"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let backend = FlakyBackend {
        calls: Arc::new(AtomicU32::new(0)),
    };
    let cache: PromiseCache<String, String, mulligan::RetryError<String>> = PromiseCache::new(Duration::from_secs(300));
    let policy = Policy::default().max_attempts(3).base_delay(Duration::from_millis(50));

    let mut lookups = Vec::new();
    for task in 0..10 {
        let backend = backend.clone();
        let policy = policy.clone();
        let lookup = cache.get("user:123".to_string(), move || async move {
            policy.run(|| backend.fetch("user:123")).await
        });
        lookups.push(async move { (task, lookup.await) });
    }

    for (task, result) in futures_util::future::join_all(lookups).await {
        println!("task {task}: {result:?}");
    }

    println!(
        "backend calls: {} (10 concurrent lookups, 1 flaky fetch retried once)",
        backend.calls.load(Ordering::Relaxed)
    );
}
