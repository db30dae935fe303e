// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Flaky Operation Example
//!
//! Runs an unreliable operation under a retry policy and prints the outcome of
//! each run. Roughly 70% of calls fail, so most runs succeed only after a few
//! backoff delays.

use std::time::Duration;

use mulligan::Policy;

async fn fetch_data() -> Result<String, String> {
    if fastrand::f64() < 0.7 {
        return Err("network error".to_string());
    }
    Ok("fetched data".to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let policy = Policy::default()
        .max_attempts(5)
        .base_delay(Duration::from_millis(250));

    match policy.run(fetch_data).await {
        Ok(data) => println!("success: {data}"),
        Err(err) => println!("failed for good: {err}"),
    }
}
