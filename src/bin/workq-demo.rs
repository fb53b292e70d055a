use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{ArgEnum, Parser};
use crossbeam::sync::WaitGroup;
use log::{debug, info};
use parking_lot::Mutex;
use workq::{PoolConfig, ShutdownPolicy, WorkerPool};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ArgEnum, Debug)]
enum Policy {
    Drop,
    Drain,
}

impl From<Policy> for ShutdownPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Drop => ShutdownPolicy::Drop,
            Policy::Drain => ShutdownPolicy::Drain,
        }
    }
}

#[derive(Parser)]
#[clap(name = "workq-demo", author, version)]
#[clap(about = "Run a batch of sleeping jobs through a worker pool", long_about = None)]
struct Args {
    /// JSON pool config, flags take precedence
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long)]
    workers: Option<usize>,

    #[clap(long, default_value = "16")]
    jobs: usize,

    /// How long each job sleeps
    #[clap(long, default_value = "10")]
    sleep_ms: u64,

    #[clap(long, arg_enum)]
    policy: Option<Policy>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PoolConfig::from_json_file(path)?,
        None => PoolConfig::default(),
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(policy) = args.policy {
        config = config.with_shutdown(policy.into());
    }

    debug!("workq-demo version: {:?}", env!("CARGO_PKG_VERSION"));
    debug!("config: {:?}", config);

    let pool = WorkerPool::with_config(config)?;
    pool.run()?;

    let done = Arc::new(Mutex::new(Vec::with_capacity(args.jobs)));
    let sleep = Duration::from_millis(args.sleep_ms);
    let start = Instant::now();
    let wg = WaitGroup::new();

    for index in 0..args.jobs {
        let done = Arc::clone(&done);
        let wg = wg.clone();
        pool.add(move || {
            thread::sleep(sleep);
            done.lock().push(index);
            drop(wg);
        })?;
    }

    // every job has been handed out; wait for the last ones to finish
    wg.wait();
    pool.stop();
    pool.join();

    let mut done = done.lock().clone();
    done.sort_unstable();
    done.dedup();
    info!("finished in {:?}", start.elapsed());

    if done.len() != args.jobs {
        bail!("expected {} distinct jobs, got {}", args.jobs, done.len());
    }
    println!(
        "completed {}/{} jobs on {} workers",
        done.len(),
        args.jobs,
        pool.workers()
    );

    Ok(())
}
