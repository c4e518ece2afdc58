//! Fixed-size pool of worker threads draining a FIFO queue.
//!
//! The pending counter tracks tasks that have been submitted but have not
//! finished running, so [`WorkerPool::finish`] also waits for tasks that
//! running tasks submit through a [`Spawner`].

use crate::error::PoolError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Worker count used when zero threads are requested.
pub const DEFAULT_THREADS: usize = 5;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Shared {
    fn execute(&self, task: Task) -> Result<(), PoolError> {
        let mut queue = self.queue.lock();
        if queue.shutdown {
            tracing::warn!("rejecting task submitted after shutdown");
            return Err(PoolError::ShutDown);
        }
        // counted before any worker can see it
        *self.pending.lock() += 1;
        queue.tasks.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    fn next_task(&self) -> Option<Task> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(task) = queue.tasks.pop_front() {
                return Some(task);
            }
            if queue.shutdown {
                return None;
            }
            self.available.wait(&mut queue);
        }
    }

    fn complete(&self) {
        let mut pending = self.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    fn run_worker(&self) {
        while let Some(task) = self.next_task() {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                tracing::error!(worker = ?thread::current().name(), "task panicked");
            }
            self.complete();
        }
        tracing::debug!(worker = ?thread::current().name(), "worker exiting");
    }
}

/// Cloneable submission handle. Tasks hold one of these to enqueue more work.
#[derive(Clone)]
pub struct Spawner {
    shared: Arc<Shared>,
}

impl Spawner {
    pub fn execute<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.execute(Box::new(task))
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        let size = if threads == 0 { DEFAULT_THREADS } else { threads };
        let shared = Arc::new(Shared::default());
        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || shared.run_worker());
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => tracing::error!(%err, worker = i, "failed to spawn worker thread"),
            }
        }
        tracing::debug!(threads = workers.len(), "worker pool started");
        Self { shared, workers: Mutex::new(workers), size }
    }

    /// Requested worker count.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Enqueues a task and returns immediately.
    pub fn execute<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.execute(Box::new(task))
    }

    pub fn spawner(&self) -> Spawner {
        Spawner { shared: Arc::clone(&self.shared) }
    }

    /// Tasks submitted and not yet completed.
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Blocks until every submitted task has completed, including tasks
    /// submitted by other tasks while waiting.
    pub fn finish(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.drained.wait(&mut pending);
        }
    }

    /// Stops accepting work. Workers drain what is queued, then exit.
    pub fn shutdown(&self) {
        let mut queue = self.shared.queue.lock();
        if !queue.shutdown {
            queue.shutdown = true;
            tracing::debug!("worker pool shutting down");
        }
        self.shared.available.notify_all();
    }

    /// Shuts down and waits for every worker thread to exit.
    pub fn join(&self) {
        self.shutdown();
        let workers = std::mem::take(&mut *self.workers.lock());
        let me = thread::current().id();
        for handle in workers {
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("worker thread panicked outside a task");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}
