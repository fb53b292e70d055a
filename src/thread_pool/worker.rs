use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use log::{debug, error, trace};

use crate::error::{PoolError, Result};
use crate::thread_pool::{run_guarded, BoxedJob};

/// One execution slot of a [`WorkerPool`](crate::WorkerPool).
///
/// The worker thread alternates between registering its handoff sender in
/// the pool's ready registry and waiting for either a job on that handoff or
/// the stop signal.
pub(crate) struct Worker {
    name: String,
    // dropping the sender disconnects `quit` on the worker side
    quit: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread. It registers itself in `ready` as soon as it
    /// is up.
    pub(crate) fn spawn(name: String, ready: Sender<Sender<BoxedJob>>) -> Result<Worker> {
        let (quit_tx, quit_rx) = channel::bounded::<()>(0);
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || work(&thread_name, ready, quit_rx))
            .map_err(PoolError::Spawn)?;

        Ok(Worker {
            name,
            quit: Some(quit_tx),
            handle: Some(handle),
        })
    }

    /// Ask the worker to exit once it is back to waiting. Does not wait for it.
    pub(crate) fn stop(&mut self) {
        if self.quit.take().is_some() {
            debug!("{}: stop requested", self.name);
        }
    }

    /// Wait for the worker thread to exit.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("{}: worker thread panicked", self.name);
            }
        }
    }
}

fn work(name: &str, ready: Sender<Sender<BoxedJob>>, quit: Receiver<()>) {
    // zero capacity: the dispatcher's send completes only once this thread takes the job
    let (handoff_tx, handoff_rx) = channel::bounded::<BoxedJob>(0);

    loop {
        trace!("{}: idle", name);
        if ready.send(handoff_tx.clone()).is_err() {
            debug!("{}: ready registry closed", name);
            break;
        }

        select! {
            recv(handoff_rx) -> job => match job {
                Ok(job) => {
                    trace!("{}: running job", name);
                    run_guarded(name, job);
                }
                Err(_) => break,
            },
            recv(quit) -> _ => break,
        }
    }

    debug!("{}: stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_swallows_thread_panic() {
        let mut worker = Worker {
            name: "test-worker".to_owned(),
            quit: None,
            handle: Some(thread::spawn(|| panic!("worker failure"))),
        };
        worker.join();
        assert!(worker.handle.is_none());
    }

    #[test]
    fn worker_exits_on_stop() {
        let (ready_tx, ready_rx) = channel::bounded(1);
        let mut worker = Worker::spawn("test-worker".to_owned(), ready_tx).unwrap();

        // registered once, then idle
        assert!(ready_rx.recv().is_ok());
        worker.stop();
        worker.stop();
        worker.join();
        assert!(ready_rx.recv().is_err());
    }
}
