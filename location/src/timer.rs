//! Timeout scheduling.

use std::fmt;
use std::time::Duration;

use futures::executor::ThreadPool;
use futures_timer::Delay;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks after a delay.
///
/// Firing a task is only a request: the task itself decides whether there is
/// still anything to do.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `after` has elapsed.
    fn schedule(&self, after: Duration, task: Task);
}

/// Default scheduler: a small thread pool driving [`Delay`] timers.
pub struct ThreadPoolScheduler {
    pool: ThreadPool,
}

impl ThreadPoolScheduler {
    /// Create a scheduler backed by a dedicated single-thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool thread cannot be spawned.
    pub fn new() -> std::io::Result<Self> {
        let pool = ThreadPool::builder()
            .pool_size(1)
            .name_prefix("pinpoint-timer-")
            .create()?;
        Ok(Self { pool })
    }
}

impl Scheduler for ThreadPoolScheduler {
    fn schedule(&self, after: Duration, task: Task) {
        self.pool.spawn_ok(async move {
            Delay::new(after).await;
            task();
        });
    }
}

impl fmt::Debug for ThreadPoolScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPoolScheduler").finish()
    }
}

#[cfg(any(test, feature = "testing"))]
pub use manual::ManualScheduler;

#[cfg(any(test, feature = "testing"))]
mod manual {
    use std::fmt;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    use super::{Scheduler, Task};

    /// Scheduler that never fires on its own.
    ///
    /// Tasks are kept with their delay until a test fires them, so races can
    /// be replayed in a fixed order.
    #[derive(Default)]
    pub struct ManualScheduler {
        armed: Mutex<Vec<(Duration, Task)>>,
    }

    impl ManualScheduler {
        /// Create a scheduler with nothing armed.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn armed(&self) -> MutexGuard<'_, Vec<(Duration, Task)>> {
            self.armed.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Delays of the tasks not yet fired, in arming order.
        #[must_use]
        pub fn delays(&self) -> Vec<Duration> {
            self.armed().iter().map(|(after, _)| *after).collect()
        }

        /// Number of tasks not yet fired.
        #[must_use]
        pub fn len(&self) -> usize {
            self.armed().len()
        }

        /// Returns `true` if nothing is armed.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.armed().is_empty()
        }

        /// Fire every armed task, returning how many ran.
        pub fn fire_all(&self) -> usize {
            // Tasks may arm new tasks, so run them outside the lock.
            let tasks = std::mem::take(&mut *self.armed());
            let count = tasks.len();
            for (_, task) in tasks {
                task();
            }
            count
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, after: Duration, task: Task) {
            self.armed().push((after, task));
        }
    }

    impl fmt::Debug for ManualScheduler {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ManualScheduler")
                .field("delays", &self.delays())
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    #[test]
    fn thread_pool_fires_after_delay() {
        let scheduler = ThreadPoolScheduler::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let started = Instant::now();

        scheduler.schedule(
            Duration::from_millis(50),
            Box::new(move || tx.send(Instant::now()).unwrap()),
        );

        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired.duration_since(started) >= Duration::from_millis(50));
    }

    #[test]
    fn manual_fires_only_when_asked() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        scheduler.schedule(
            Duration::from_secs(5),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(scheduler.delays(), vec![Duration::from_secs(5)]);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.fire_all(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_empty());
    }
}
