//! pool errors

use thiserror::Error;

/// Result for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Error for pool
#[derive(Error, Debug)]
pub enum PoolError {
    /// A pool needs at least one worker to make progress
    #[error("worker pool needs at least one worker")]
    NoWorkers,

    /// `run` was called on a pool that is already running
    #[error("worker pool is already running")]
    AlreadyRunning,

    /// The pool has been stopped and takes no more jobs
    #[error("worker pool is stopped")]
    Stopped,

    /// Spawning a pool thread failed
    #[error("failed to spawn pool thread")]
    Spawn(#[source] std::io::Error),

    /// Io error
    #[error("Io Error")]
    Io(#[from] std::io::Error),

    /// serde json error
    #[error("invalid pool config")]
    Config(#[from] serde_json::Error),
}
