//! Engine configuration.
//!
//! Defaults mirror the values the engine was tuned with; environment variables
//! `SEARCH_ACCUMULATOR_BUCKETS` and `SEARCH_WORKER_THREADS` override them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCUMULATOR_BUCKETS: usize = 10;

const ENV_ACCUMULATOR_BUCKETS: &str = "SEARCH_ACCUMULATOR_BUCKETS";
const ENV_WORKER_THREADS: &str = "SEARCH_WORKER_THREADS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of independently locked buckets in the ranking accumulator.
    pub accumulator_buckets: usize,
    /// Size of a dedicated worker pool for parallel mode. `None` uses the
    /// global rayon pool.
    pub worker_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { accumulator_buckets: DEFAULT_ACCUMULATOR_BUCKETS, worker_threads: None }
    }
}

impl EngineConfig {
    /// Defaults overlaid with whatever the environment provides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(buckets) = read_env_usize(ENV_ACCUMULATOR_BUCKETS) {
            config.accumulator_buckets = buckets;
        }
        if let Some(threads) = read_env_usize(ENV_WORKER_THREADS) {
            config.worker_threads = Some(threads);
        }
        config
    }

    pub fn with_accumulator_buckets(mut self, buckets: usize) -> Self {
        self.accumulator_buckets = buckets;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Bucket count actually used; never zero.
    pub fn bucket_count(&self) -> usize {
        self.accumulator_buckets.max(1)
    }
}

fn read_env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.accumulator_buckets, DEFAULT_ACCUMULATOR_BUCKETS);
        assert_eq!(config.worker_threads, None);
    }

    #[test]
    fn zero_buckets_clamped() {
        let config = EngineConfig::default().with_accumulator_buckets(0);
        assert_eq!(config.bucket_count(), 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"worker_threads": 3}"#).unwrap();
        assert_eq!(config.worker_threads, Some(3));
        assert_eq!(config.accumulator_buckets, DEFAULT_ACCUMULATOR_BUCKETS);
    }
}
