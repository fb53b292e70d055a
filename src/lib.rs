#![deny(missing_docs)]

//! Job dispatch library
//!
//! Two building blocks live here:
//!
//! * [`BlockingQueue`], a monitor-protected FIFO whose consumers may block
//!   until an item shows up.
//! * [`WorkerPool`], a fixed set of worker threads fed by a dispatch loop that
//!   hands every submitted [`Job`] to exactly one idle worker.
//!
//! ```no_run
//! use workq::WorkerPool;
//!
//! # fn main() -> workq::Result<()> {
//! let pool = WorkerPool::new(4)?;
//! pool.run()?;
//! pool.add(|| println!("hello from a worker"))?;
//! pool.stop();
//! pool.join();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod thread_pool;

pub use crate::config::{PoolConfig, ShutdownPolicy};
pub use crate::error::{PoolError, Result};
pub use crate::queue::BlockingQueue;
pub use crate::thread_pool::{BoxedJob, Job, SharedQueueThreadPool, ThreadPool, WorkerPool};
