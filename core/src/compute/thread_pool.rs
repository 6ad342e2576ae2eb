//! Fixed-size worker thread pool.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct PoolState {
    tasks: VecDeque<Task>,
    active: usize,
    shutdown: bool,
}

impl PoolState {
    fn is_idle(&self) -> bool {
        self.active == 0 && self.tasks.is_empty()
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<PoolState>,
    task_ready: Condvar,
    idle: Condvar,
}

/// A pool of worker threads executing submitted closures.
///
/// Tasks run on the first free worker; when every worker is busy they wait in
/// a FIFO queue. There are no priorities. Dropping the pool lets the workers
/// drain the queue and then joins them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use ember_core::compute::ThreadPool;
///
/// let pool = ThreadPool::new(2);
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..8 {
///     let counter = counter.clone();
///     pool.start(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
/// }
/// assert!(pool.wait_for_done(None));
/// assert_eq!(counter.load(Ordering::SeqCst), 8);
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Create a pool with `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let shared = Arc::new(Shared::default());
        let mut workers = Vec::with_capacity(threads.max(1));

        for index in 0..threads.max(1) {
            let worker_shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("ember-worker-{index}"))
                .spawn(move || worker_loop(&worker_shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("Failed to spawn worker thread {}: {}", index, e),
            }
        }

        log::debug!("ThreadPool started with {} workers", workers.len());
        Self { shared, workers }
    }

    /// Create a pool sized to the machine's available parallelism.
    pub fn with_optimal_threads() -> Self {
        Self::new(Self::optimal_thread_count())
    }

    /// Number of hardware threads available to the process.
    pub fn optimal_thread_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Number of worker threads.
    pub fn max_threads(&self) -> usize {
        self.workers.len()
    }

    /// Number of tasks waiting for a free worker.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Submit a task.
    pub fn start<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.state.lock().tasks.push_back(Box::new(task));
        self.shared.task_ready.notify_one();
    }

    /// Block until the queue is empty and no worker is running a task.
    ///
    /// Returns `false` if `timeout` elapsed first, or if tasks are pending
    /// and the pool has no workers to run them.
    pub fn wait_for_done(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        if self.workers.is_empty() && !state.is_idle() {
            log::warn!("ThreadPool has no workers; {} tasks will not run", state.tasks.len());
            return false;
        }
        while !state.is_idle() {
            match deadline {
                Some(deadline) => {
                    if self.shared.idle.wait_until(&mut state, deadline).timed_out() {
                        return state.is_idle();
                    }
                }
                None => self.shared.idle.wait(&mut state),
            }
        }
        true
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::with_optimal_threads()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.task_ready.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Worker thread terminated abnormally");
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("pending", &self.pending())
            .finish()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.tasks.pop_front() {
                    state.active += 1;
                    break task;
                }
                if state.shutdown {
                    return;
                }
                shared.task_ready.wait(&mut state);
            }
        };

        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            log::error!("Worker task panicked");
        }

        let mut state = shared.state.lock();
        state.active -= 1;
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_all_tasks() {
        let pool = ThreadPool::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..32 {
            let counter = counter.clone();
            pool.start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(pool.wait_for_done(Some(Duration::from_secs(5))));
        assert_eq!(counter.load(Ordering::SeqCst), 32);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_single_worker_is_fifo() {
        let pool = ThreadPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10 {
            let order = order.clone();
            pool.start(move || order.lock().push(i));
        }
        assert!(pool.wait_for_done(None));
        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_wait_times_out_on_long_task() {
        let pool = ThreadPool::new(1);
        let release = Arc::new((Mutex::new(false), Condvar::new()));
        let gate = release.clone();
        pool.start(move || {
            let (lock, cvar) = &*gate;
            let mut open = lock.lock();
            while !*open {
                cvar.wait(&mut open);
            }
        });

        assert!(!pool.wait_for_done(Some(Duration::from_millis(20))));

        *release.0.lock() = true;
        release.1.notify_all();
        assert!(pool.wait_for_done(None));
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let pool = ThreadPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        pool.start(|| panic!("task failure"));
        let c = counter.clone();
        pool.start(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(pool.wait_for_done(Some(Duration::from_secs(5))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::new(2);
            for _ in 0..16 {
                let counter = counter.clone();
                pool.start(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_wait_without_workers_returns() {
        let pool = ThreadPool {
            shared: Arc::new(Shared::default()),
            workers: Vec::new(),
        };
        assert!(pool.wait_for_done(None));

        pool.start(|| {});
        assert!(!pool.wait_for_done(None));
        assert_eq!(pool.pending(), 1);
    }

    #[test]
    fn test_zero_threads_still_gets_a_worker() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.max_threads(), 1);
    }
}
