//! pool configuration

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PoolError, Result};

/// What the dispatch loop does with submissions still waiting when it is told to stop.
#[derive(Deserialize, Default, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Leave waiting submissions undispatched; their `add` calls fail with
    /// [`PoolError::Stopped`].
    #[default]
    Drop,

    /// Hand every submission that is already waiting to a worker before the
    /// workers are stopped.
    Drain,
}

/// Worker pool settings
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Shutdown behaviour
    pub shutdown: ShutdownPolicy,

    /// Prefix of every pool thread name
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            workers: num_cpus::get(),
            shutdown: ShutdownPolicy::default(),
            thread_name: "workq".to_owned(),
        }
    }
}

impl PoolConfig {
    /// Default settings with `workers` worker threads.
    pub fn new(workers: usize) -> Self {
        PoolConfig {
            workers,
            ..PoolConfig::default()
        }
    }

    /// Load settings from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<PoolConfig> {
        let reader = BufReader::new(File::open(path)?);
        let config: PoolConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the shutdown policy.
    pub fn with_shutdown(mut self, shutdown: ShutdownPolicy) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Set the thread name prefix.
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PoolError::NoWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_keep_defaults() {
        let config: PoolConfig = serde_json::from_str(r#"{"workers": 3}"#).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.shutdown, ShutdownPolicy::Drop);
        assert_eq!(ShutdownPolicy::default(), ShutdownPolicy::Drop);
        assert_eq!(config.thread_name, "workq");
    }

    #[test]
    fn policy_is_lowercase() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"shutdown": "drain", "thread_name": "io"}"#).unwrap();
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
        assert_eq!(config.thread_name, "io");
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            PoolConfig::new(0).validate(),
            Err(PoolError::NoWorkers)
        ));
        assert!(PoolConfig::new(1).validate().is_ok());
    }
}
