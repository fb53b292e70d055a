use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use crossbeam::select;
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use crate::config::{PoolConfig, ShutdownPolicy};
use crate::error::{PoolError, Result};
use crate::thread_pool::worker::Worker;
use crate::thread_pool::{BoxedJob, Job, ThreadPool};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    Idle,
    Running,
    Stopped,
}

struct Inner {
    state: State,
    // submission receiver, moved into the dispatch loop by `run`
    jobs: Option<Receiver<BoxedJob>>,
    // dropped by `stop`, which disconnects the dispatch loop's stop receiver
    stop: Option<Sender<()>>,
    dispatcher: Option<JoinHandle<Vec<Worker>>>,
}

/// Fixed-size pool of worker threads.
///
/// Jobs go through an unbuffered submission channel to a dispatch loop. The
/// loop waits for an idle worker in the ready registry and hands the job to
/// that worker over the worker's own zero-capacity channel, so each job runs
/// on exactly one worker. [`WorkerPool::add`] returns once the dispatch loop
/// has taken the job, which throttles submitters to worker availability.
///
/// No ordering is guaranteed between jobs.
pub struct WorkerPool {
    config: PoolConfig,
    jobs: Sender<BoxedJob>,
    stop_rx: Receiver<()>,
    inner: Mutex<Inner>,
}

impl WorkerPool {
    /// Create a pool of `workers` workers with default settings. The pool
    /// does nothing until [`WorkerPool::run`].
    pub fn new(workers: usize) -> Result<WorkerPool> {
        WorkerPool::with_config(PoolConfig::new(workers))
    }

    /// Create a pool from `config`.
    pub fn with_config(config: PoolConfig) -> Result<WorkerPool> {
        config.validate()?;

        let (jobs_tx, jobs_rx) = channel::bounded(0);
        let (stop_tx, stop_rx) = channel::bounded(0);

        Ok(WorkerPool {
            config,
            jobs: jobs_tx,
            stop_rx,
            inner: Mutex::new(Inner {
                state: State::Idle,
                jobs: Some(jobs_rx),
                stop: Some(stop_tx),
                dispatcher: None,
            }),
        })
    }

    /// Start the workers and the dispatch loop.
    pub fn run(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Running => return Err(PoolError::AlreadyRunning),
            State::Stopped => return Err(PoolError::Stopped),
            State::Idle => {}
        }
        let jobs = inner.jobs.take().ok_or(PoolError::Stopped)?;

        match self.start(jobs) {
            Ok(dispatcher) => {
                inner.state = State::Running;
                inner.dispatcher = Some(dispatcher);
                info!(
                    "{}: running with {} workers",
                    self.config.thread_name, self.config.workers
                );
                Ok(())
            }
            Err(e) => {
                // whatever was spawned has already been told to quit
                error!("{}: failed to start: {}", self.config.thread_name, e);
                inner.state = State::Stopped;
                inner.stop = None;
                Err(e)
            }
        }
    }

    fn start(&self, jobs: Receiver<BoxedJob>) -> Result<JoinHandle<Vec<Worker>>> {
        let (ready_tx, ready_rx) = channel::bounded(self.config.workers);

        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let name = format!("{}-{}", self.config.thread_name, id);
            workers.push(Worker::spawn(name, ready_tx.clone())?);
        }
        // only workers may hold the registry sender, so the dispatch loop
        // notices once every worker is gone
        drop(ready_tx);

        let dispatcher = Dispatcher {
            name: format!("{}-dispatch", self.config.thread_name),
            policy: self.config.shutdown,
            jobs,
            ready: ready_rx,
            stop: self.stop_rx.clone(),
            workers,
        };

        thread::Builder::new()
            .name(dispatcher.name.clone())
            .spawn(move || dispatcher.run())
            .map_err(PoolError::Spawn)
    }

    /// Submit `job`, blocking until the dispatch loop takes it.
    ///
    /// A job submitted before [`WorkerPool::run`] waits for the pool to start.
    /// Fails with [`PoolError::Stopped`] once the pool is stopping.
    pub fn add(&self, job: impl Job) -> Result<()> {
        if self.is_stopped() {
            warn!("{}: job rejected, pool is stopped", self.config.thread_name);
            return Err(PoolError::Stopped);
        }

        self.jobs.send(Box::new(job)).map_err(|_| {
            warn!("{}: job rejected, pool stopped", self.config.thread_name);
            PoolError::Stopped
        })
    }

    /// Signal the dispatch loop to shut down and return immediately.
    ///
    /// Jobs already running finish. What happens to submissions still
    /// waiting depends on the [`ShutdownPolicy`]. Calling this more than once,
    /// or before `run`, is harmless.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state == State::Stopped {
            return;
        }
        inner.state = State::Stopped;
        inner.stop = None;
        // never started: release submitters parked on the channel
        inner.jobs = None;
        info!("{}: stop requested", self.config.thread_name);
    }

    /// Wait for the dispatch loop and every worker thread to exit.
    ///
    /// Blocks until someone calls [`WorkerPool::stop`]. Returns at once for a
    /// pool that never ran or was already joined.
    pub fn join(&self) {
        let dispatcher = self.inner.lock().dispatcher.take();
        if let Some(dispatcher) = dispatcher {
            match dispatcher.join() {
                Ok(mut workers) => {
                    for worker in workers.iter_mut() {
                        worker.join();
                    }
                }
                Err(_) => error!("{}: dispatch loop panicked", self.config.thread_name),
            }
            debug!("{}: joined", self.config.thread_name);
        }
    }

    /// Configured number of workers.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Whether `run` succeeded and `stop` has not been called yet.
    pub fn is_running(&self) -> bool {
        self.inner.lock().state == State::Running
    }

    fn is_stopped(&self) -> bool {
        self.inner.lock().state == State::Stopped
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ThreadPool for WorkerPool {
    fn new(threads: u32) -> Result<WorkerPool> {
        let pool = WorkerPool::with_config(PoolConfig::new(threads as usize))?;
        pool.run()?;
        Ok(pool)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = self.add(job) {
            error!("{}: spawn failed: {}", self.config.thread_name, e);
        }
    }
}

struct Dispatcher {
    name: String,
    policy: ShutdownPolicy,
    jobs: Receiver<BoxedJob>,
    ready: Receiver<Sender<BoxedJob>>,
    stop: Receiver<()>,
    workers: Vec<Worker>,
}

impl Dispatcher {
    fn run(mut self) -> Vec<Worker> {
        loop {
            // a stop seen while a dispatch was in flight wins over waiting jobs
            if let Err(TryRecvError::Disconnected) = self.stop.try_recv() {
                break;
            }
            select! {
                recv(self.jobs) -> job => match job {
                    Ok(job) => self.dispatch(job),
                    Err(_) => break,
                },
                recv(self.stop) -> _ => break,
            }
        }

        if self.policy == ShutdownPolicy::Drain {
            let mut drained = 0;
            while let Ok(job) = self.jobs.try_recv() {
                self.dispatch(job);
                drained += 1;
            }
            debug!("{}: drained {} waiting jobs", self.name, drained);
        }

        for worker in self.workers.iter_mut() {
            worker.stop();
        }
        debug!("{}: stopped", self.name);
        self.workers
    }

    /// Hand `job` to the next idle worker, waiting for one if all are busy.
    fn dispatch(&self, job: BoxedJob) {
        // workers only quit once this loop has returned, so the registry stays
        // connected and every handoff in it has a live worker waiting on it
        let sent = match self.ready.recv() {
            Ok(handoff) => handoff.send(job).is_ok(),
            Err(_) => false,
        };
        debug_assert!(sent, "no live worker took the job");
        trace!("{}: job dispatched", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;
    use std::time::Duration;

    fn dispatcher(ready: Receiver<Sender<BoxedJob>>) -> Dispatcher {
        let (_, jobs) = channel::bounded(0);
        let (_, stop) = channel::bounded(0);
        Dispatcher {
            name: "test-dispatch".to_owned(),
            policy: ShutdownPolicy::Drop,
            jobs,
            ready,
            stop,
            workers: Vec::new(),
        }
    }

    #[test]
    fn dispatch_waits_for_an_idle_worker() {
        let (ready_tx, ready_rx) = channel::bounded(1);
        let dispatcher = dispatcher(ready_rx);
        let (ran_tx, ran_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let (handoff_tx, handoff_rx) = channel::bounded::<BoxedJob>(0);
            ready_tx.send(handoff_tx).unwrap();
            handoff_rx.recv().unwrap().run();
        });

        dispatcher.dispatch(Box::new(move || ran_tx.send(1).unwrap()));
        assert_eq!(ran_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        worker.join().unwrap();
    }

    #[test]
    fn dispatch_hands_job_to_registered_worker() {
        let (ready_tx, ready_rx) = channel::bounded(2);
        let dispatcher = dispatcher(ready_rx);

        let (first_tx, first_rx) = channel::bounded::<BoxedJob>(0);
        let (second_tx, second_rx) = channel::bounded::<BoxedJob>(0);
        ready_tx.send(first_tx).unwrap();
        ready_tx.send(second_tx).unwrap();

        let first = thread::spawn(move || first_rx.recv().is_ok());
        dispatcher.dispatch(Box::new(|| {}));
        assert!(first.join().unwrap());

        // registry order decides who is next
        let second = thread::spawn(move || second_rx.recv().is_ok());
        dispatcher.dispatch(Box::new(|| {}));
        assert!(second.join().unwrap());
    }
}
