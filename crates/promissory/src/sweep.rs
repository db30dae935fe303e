// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Lifecycle of the background sweep task.
///
/// Owns at most one periodic task at any time: starting replaces (and aborts) any
/// previous task, stopping when idle is a no-op, and dropping the owner aborts the
/// task so a forgotten stop cannot leak a periodic task for the process lifetime.
#[derive(Debug, Default)]
pub(crate) struct Sweeper {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawns a task that invokes `sweep` once per `interval`.
    ///
    /// `sweep` returns `None` once its target is gone, which ends the task on the
    /// following tick.
    pub(crate) fn start<F>(&self, interval: Duration, mut sweep: F)
    where
        F: FnMut() -> Option<usize> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut timer = time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; skip it so the first
            // sweep lands one full interval after start.
            timer.tick().await;
            loop {
                timer.tick().await;
                if sweep().is_none() {
                    break;
                }
            }
        });

        if let Some(previous) = self.task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Aborts the periodic task if one is running.
    pub(crate) fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(count: &Arc<AtomicUsize>) -> impl FnMut() -> Option<usize> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            Some(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_once_per_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let sweeper = Sweeper::default();
        sweeper.start(Duration::from_secs(1), counting(&count));

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_task() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let sweeper = Sweeper::default();

        sweeper.start(Duration::from_secs(1), counting(&first));
        sweeper.start(Duration::from_secs(1), counting(&second));

        time::sleep(Duration::from_millis(2500)).await;

        // Exactly one schedule is live: one sweep per interval, not two.
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_sweeping_and_is_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let sweeper = Sweeper::default();
        sweeper.start(Duration::from_secs(1), counting(&count));

        time::sleep(Duration::from_millis(1500)).await;
        sweeper.stop();
        sweeper.stop();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_start_is_a_noop() {
        let sweeper = Sweeper::default();
        sweeper.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_task() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let sweeper = Sweeper::default();
            sweeper.start(Duration::from_secs(1), counting(&count));
        }

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ends_when_target_reports_gone() {
        let count = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&count);
        let sweeper = Sweeper::default();
        sweeper.start(Duration::from_secs(1), move || {
            let calls = probe.fetch_add(1, Ordering::SeqCst) + 1;
            (calls < 3).then_some(0)
        });

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
