//! queues

mod blocking_queue;

pub use blocking_queue::BlockingQueue;
