use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info};

use crate::error::{PoolError, Result};
use crate::queue::BlockingQueue;
use crate::thread_pool::{run_guarded, BoxedJob, Job, ThreadPool};

enum Message {
    Run(BoxedJob),
    Shutdown,
}

/// Thread pool whose threads take jobs from one shared [`BlockingQueue`].
///
/// Unlike [`WorkerPool`](crate::WorkerPool), submitting never blocks: jobs
/// pile up in the queue and threads pick them up in FIFO order. Dropping the
/// pool lets the threads finish every job queued before the drop, then joins
/// them.
pub struct SharedQueueThreadPool {
    queue: Arc<BlockingQueue<Message>>,
    threads: Vec<JoinHandle<()>>,
}

impl SharedQueueThreadPool {
    /// Start a pool of `threads` threads.
    pub fn with_threads(threads: usize) -> Result<SharedQueueThreadPool> {
        if threads == 0 {
            return Err(PoolError::NoWorkers);
        }

        let mut pool = SharedQueueThreadPool {
            queue: Arc::new(BlockingQueue::new()),
            threads: Vec::with_capacity(threads),
        };
        for id in 0..threads {
            let name = format!("shared-queue-{}", id);
            let queue = Arc::clone(&pool.queue);
            // on error the pool drops here and shuts down what was spawned
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || serve(&name, &queue))
                .map_err(PoolError::Spawn)?;
            pool.threads.push(handle);
        }

        info!("shared queue pool running with {} threads", threads);
        Ok(pool)
    }

    /// Queue `job` for the next free thread.
    pub fn execute(&self, job: impl Job) {
        self.queue.enqueue(Message::Run(Box::new(job)));
    }

    /// Number of jobs waiting for a thread.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

fn serve(name: &str, queue: &BlockingQueue<Message>) {
    loop {
        match queue.blocking_dequeue() {
            Message::Run(job) => run_guarded(name, job),
            Message::Shutdown => break,
        }
    }
    debug!("{}: stopped", name);
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<SharedQueueThreadPool> {
        SharedQueueThreadPool::with_threads(threads as usize)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(job);
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        for _ in 0..self.threads.len() {
            self.queue.enqueue(Message::Shutdown);
        }
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("shared queue pool thread panicked");
            }
        }
        debug!("shared queue pool joined");
    }
}
