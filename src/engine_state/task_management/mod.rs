//! # Task Management System
//!
//! A fixed pool of worker threads executing [`Task`]s in FIFO order, with results handed back to
//! the thread that owns the manager.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the workers and both queues
//! - job queue: mutex-guarded FIFO the workers poll; a worker that finds it empty or contended
//!   sleeps for [`POLL_INTERVAL`] and tries again
//! - finalize queue: mutex-guarded FIFO of finished tasks, drained on the owning thread
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The first idle worker pops the oldest task and runs it
//! 3. The finished task is pushed onto the finalize queue
//! 4. Each call to `process_completed_tasks()` finalizes at most one task on the owning thread
//!
//! ## Shutdown
//! Dropping the manager raises the kill flag and joins every worker. Tasks still queued are
//! dropped without running or finalizing; there is no cancellation of a running task. A worker
//! that died from a panic is logged, and the first panic is resumed on the dropping thread unless
//! it is already unwinding.
//!
//! ## Example Usage
//! ```rust
//! use sparse_voxel_engine::engine_state::task_management::{task::Task, TaskManager};
//!
//! struct Square(u64, u64);
//!
//! impl Task<Vec<u64>> for Square {
//!     fn run(&mut self) {
//!         self.1 = self.0 * self.0;
//!     }
//!
//!     fn finalize_in_main_thread(self: Box<Self>, results: &mut Vec<u64>) {
//!         results.push(self.1);
//!     }
//! }
//!
//! let mut task_manager = TaskManager::<Vec<u64>>::new(2);
//! task_manager.publish_task(Box::new(Square(3, 0)));
//!
//! let mut results = Vec::new();
//! while results.is_empty() {
//!     task_manager.process_completed_tasks(&mut results);
//! }
//! assert_eq!(results, vec![9]);
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, trace};
use task::Task;

/// How long an idle worker sleeps before polling the job queue again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

type TaskQueue<C> = Arc<Mutex<VecDeque<Box<dyn Task<C>>>>>;

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Implementation Notes
/// - Workers never touch the context `C`; only `process_completed_tasks()` does
/// - A panic inside `Task::run` is not caught and takes its worker down
pub struct TaskManager<C: ?Sized + 'static> {
    workers: Vec<JoinHandle<()>>,
    job_queue: TaskQueue<C>,
    finalize_queue: TaskQueue<C>,
    kill_flag: Arc<AtomicBool>,
    /// Published tasks not yet finalized.
    tasks_in_flight: usize,
}

fn worker_loop<C: ?Sized + 'static>(
    job_queue: TaskQueue<C>,
    finalize_queue: TaskQueue<C>,
    kill_flag: Arc<AtomicBool>,
) {
    while !kill_flag.load(Ordering::Acquire) {
        let job = match job_queue.try_lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };

        match job {
            Some(mut job) => {
                job.run();
                finalize_queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(job);
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}

impl<C: ?Sized + 'static> TaskManager<C> {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// # Panics
    /// Panics if the underlying thread creation fails.
    pub fn new(num_workers: usize) -> Self {
        let job_queue: TaskQueue<C> = Arc::new(Mutex::new(VecDeque::new()));
        let finalize_queue: TaskQueue<C> = Arc::new(Mutex::new(VecDeque::new()));
        let kill_flag = Arc::new(AtomicBool::new(false));

        info!(
            "Available parallelism: {:?}, starting {} workers",
            thread::available_parallelism(),
            num_workers
        );

        let workers = (0..num_workers)
            .map(|_| {
                let job_queue = job_queue.clone();
                let finalize_queue = finalize_queue.clone();
                let kill_flag = kill_flag.clone();
                thread::spawn(move || worker_loop(job_queue, finalize_queue, kill_flag))
            })
            .collect();

        TaskManager {
            workers,
            job_queue,
            finalize_queue,
            kill_flag,
            tasks_in_flight: 0,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Appends a task to the back of the job queue.
    pub fn publish_task(&mut self, task: Box<dyn Task<C>>) {
        self.job_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
        self.tasks_in_flight += 1;
    }

    /// Finalizes the oldest finished task, if any.
    ///
    /// Must be called from the thread that owns the manager, typically once per tick.
    ///
    /// # Returns
    /// `true` when a task was finalized.
    pub fn process_completed_tasks(&mut self, context: &mut C) -> bool {
        let finished = self
            .finalize_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match finished {
            Some(task) => {
                task.finalize_in_main_thread(context);
                self.tasks_in_flight -= 1;
                trace!("Finalized task, {} still in flight", self.tasks_in_flight);
                true
            }
            None => false,
        }
    }

    /// Tasks published and not yet finalized, queued, running or waiting to finalize.
    pub fn tasks_in_flight(&self) -> usize {
        self.tasks_in_flight
    }

    /// Tasks no worker has picked up yet.
    pub fn queued_task_count(&self) -> usize {
        self.job_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Finished tasks waiting for `process_completed_tasks()`.
    pub fn completed_task_count(&self) -> usize {
        self.finalize_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic>"
    }
}

impl<C: ?Sized + 'static> Drop for TaskManager<C> {
    fn drop(&mut self) {
        self.kill_flag.store(true, Ordering::Release);
        let mut first_panic = None;
        for (i, worker) in self.workers.drain(..).enumerate() {
            info!("Joining thread {i}");
            if let Err(payload) = worker.join() {
                error!("Worker {i} panicked: {}", panic_message(payload.as_ref()));
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            if !thread::panicking() {
                std::panic::resume_unwind(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    struct Record {
        id: usize,
        ran_on: Option<thread::ThreadId>,
    }

    impl Task<Vec<(usize, bool)>> for Record {
        fn run(&mut self) {
            self.ran_on = Some(thread::current().id());
        }

        fn finalize_in_main_thread(self: Box<Self>, finalized: &mut Vec<(usize, bool)>) {
            let ran_elsewhere = self.ran_on.is_some_and(|id| id != thread::current().id());
            finalized.push((self.id, ran_elsewhere));
        }
    }

    fn drain(
        manager: &mut TaskManager<Vec<(usize, bool)>>,
        finalized: &mut Vec<(usize, bool)>,
        expected: usize,
    ) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while finalized.len() < expected && Instant::now() < deadline {
            if !manager.process_completed_tasks(finalized) {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn every_task_is_finalized_once() {
        let mut manager = TaskManager::new(4);
        for id in 0..32 {
            manager.publish_task(Box::new(Record { id, ran_on: None }));
        }
        assert_eq!(manager.tasks_in_flight(), 32);

        let mut finalized = Vec::new();
        drain(&mut manager, &mut finalized, 32);

        let mut ids: Vec<usize> = finalized.iter().map(|(id, _)| *id).collect();
        ids.sort();
        assert_eq!(ids, (0..32).collect::<Vec<_>>());
        assert!(finalized.iter().all(|(_, ran_elsewhere)| *ran_elsewhere));
        assert_eq!(manager.tasks_in_flight(), 0);
        assert!(!manager.process_completed_tasks(&mut finalized));
    }

    #[test]
    fn one_task_finalized_per_call() {
        let mut manager = TaskManager::new(1);
        for id in 0..3 {
            manager.publish_task(Box::new(Record { id, ran_on: None }));
        }
        let deadline = Instant::now() + Duration::from_secs(10);
        while manager.completed_task_count() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        let mut finalized = Vec::new();
        assert!(manager.process_completed_tasks(&mut finalized));
        assert_eq!(finalized.len(), 1);
        // a single worker preserves FIFO order
        assert_eq!(finalized[0].0, 0);
    }

    struct Explode;

    impl Task<Vec<(usize, bool)>> for Explode {
        fn run(&mut self) {
            panic!("mesher blew up");
        }

        fn finalize_in_main_thread(self: Box<Self>, _: &mut Vec<(usize, bool)>) {}
    }

    #[test]
    fn worker_panic_resurfaces_on_drop() {
        let mut manager = TaskManager::<Vec<(usize, bool)>>::new(1);
        manager.publish_task(Box::new(Explode));
        let deadline = Instant::now() + Duration::from_secs(10);
        while manager.queued_task_count() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || drop(manager)));
        let payload = result.expect_err("the worker panic must not be swallowed");
        assert_eq!(panic_message(payload.as_ref()), "mesher blew up");
    }

    #[test]
    fn drop_abandons_queued_tasks() {
        let mut manager = TaskManager::<Vec<(usize, bool)>>::new(0);
        manager.publish_task(Box::new(Record { id: 0, ran_on: None }));
        assert_eq!(manager.queued_task_count(), 1);
        drop(manager);
    }
}
