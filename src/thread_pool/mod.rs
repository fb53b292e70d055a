//! thread pools

mod shared_queue_thread_pool;
mod worker;
mod worker_pool;

pub use shared_queue_thread_pool::SharedQueueThreadPool;
pub use worker_pool::WorkerPool;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::error;

use crate::Result;

/// Unit of work executed exactly once by one pool thread.
pub trait Job: Send + 'static {
    /// Execute the job.
    fn run(self: Box<Self>);
}

impl<F> Job for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// Type-erased job
pub type BoxedJob = Box<dyn Job>;

/// thread pool
pub trait ThreadPool {
    /// create a started thread pool with `threads` threads
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// spawn a job
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

/// Run `job`, containing a panic to the current job so the calling thread
/// keeps serving.
pub(crate) fn run_guarded(worker: &str, job: BoxedJob) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || job.run())) {
        error!("{}: job panicked: {}", worker, panic_message(&*payload));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
