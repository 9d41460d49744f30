//! # Task System Core Trait
//!
//! ## Task Lifecycle
//! 1. A `Task` is created on the main thread and published via `TaskManager::publish_task()`
//! 2. A worker thread takes it from the job queue and calls `run()`
//! 3. The worker moves the finished task onto the finalize queue
//! 4. The main thread pops it in `process_completed_tasks()` and calls
//!    `finalize_in_main_thread()` with its context
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - A task should own a copy of everything `run()` reads; shared state is only touched from
//!   `finalize_in_main_thread()`

/// A unit of work split into a background half and a main-thread half.
///
/// `C` is the main-thread context handed to every finalize call, for the renderer the render
/// backend.
pub trait Task<C: ?Sized>: Send {
    /// Does the work. Runs on a worker thread and must not block on the main thread.
    fn run(&mut self);

    /// Publishes the result. Runs on the main thread, once per task, after `run()`.
    fn finalize_in_main_thread(self: Box<Self>, context: &mut C);
}
