//! Engine configuration via `tessera.toml`
//!
//! Settings for the worker pool and progress reporting live in one small
//! TOML file. Missing fields take their defaults, so an empty file is a
//! valid configuration.

use crate::driver::FilterRunner;
use crate::message::TracingMessageHandler;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tessera_concurrency::ParallelConfig;
use tessera_core::{Error, Result};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

fn default_progress_interval_ms() -> u64 {
    1000
}

/// Engine configuration loaded from `tessera.toml`.
///
/// # Example
///
/// ```toml
/// progress_interval_ms = 1000
///
/// [parallel]
/// enabled = true
/// max_threads = 8
/// min_grain_size = 256
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker pool settings
    #[serde(default)]
    pub parallel: ParallelConfig,
    /// Minimum time between two progress messages
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig::default(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl EngineConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tessera engine configuration

# Minimum time between two progress messages of one filter (default: 1000)
progress_interval_ms = 1000

[parallel]
# Run filter kernels on a worker pool (default: true).
# false runs every kernel on the calling thread with identical results.
enabled = true

# Worker thread cap. Omit to use one thread per core.
# max_threads = 8

# Minimum indices per chunk when a kernel does not choose its own chunking
min_grain_size = 256
"#
    }

    /// Progress interval as a duration
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Check values that parse but make no sense
    pub fn validate(&self) -> Result<()> {
        if self.parallel.max_threads == Some(0) {
            return Err(Error::invalid_argument(
                "parallel.max_threads must be at least 1",
            ));
        }
        if self.parallel.min_grain_size == 0 {
            return Err(Error::invalid_argument(
                "parallel.min_grain_size must be at least 1",
            ));
        }
        Ok(())
    }

    /// Worker pool for filter execution
    ///
    /// With parallelism disabled this is a single-thread pool, so kernels
    /// run one chunk at a time.
    pub fn thread_pool(&self) -> Option<Arc<ThreadPool>> {
        if self.parallel.enabled {
            return self.parallel.build_pool();
        }
        ParallelConfig {
            enabled: true,
            max_threads: Some(1),
            ..self.parallel.clone()
        }
        .build_pool()
    }

    /// Filter runner using this configuration's pool and chunking
    pub fn runner(&self) -> FilterRunner {
        let runner = match self.thread_pool() {
            Some(pool) => FilterRunner::with_thread_pool(pool),
            None => FilterRunner::new(),
        };
        runner.with_parallel_config(self.parallel.clone())
    }

    /// Message handler forwarding to `tracing` with this config's progress throttle
    pub fn message_handler(&self, source: impl Into<String>) -> TracingMessageHandler {
        TracingMessageHandler::new(source).with_progress_interval(self.progress_interval())
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid_argument(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_argument(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
