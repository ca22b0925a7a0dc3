use std::{env, time::Duration};

use thiserror::Error;

use crate::{
    store::in_memory_store::StoreLatency,
    transfer::{bulk::DEFAULT_WORKERS, engine::DEFAULT_TRANSFER_TIMEOUT},
};

pub const TRANSFER_TIMEOUT_VAR: &str = "LEDGER_TRANSFER_TIMEOUT_MS";
pub const BULK_WORKERS_VAR: &str = "LEDGER_BULK_WORKERS";
pub const LOOKUP_LATENCY_VAR: &str = "LEDGER_LOOKUP_LATENCY_MS";
pub const UPDATE_LATENCY_VAR: &str = "LEDGER_UPDATE_LATENCY_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got `{value}`")]
    NotANumber { var: &'static str, value: String },
    #[error("{var} must be at least 1")]
    ZeroWorkers { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub transfer_timeout: Duration,
    pub bulk_workers: usize,
    pub store_latency: StoreLatency,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            bulk_workers: DEFAULT_WORKERS,
            store_latency: StoreLatency::default(),
        }
    }
}

impl LedgerConfig {
    /// Defaults, overridden by any `LEDGER_*` variable that is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let number = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(var)
                .map(|value| {
                    value.trim().parse::<u64>().map_err(|_| ConfigError::NotANumber {
                        var,
                        value: value.clone(),
                    })
                })
                .transpose()
        };

        if let Some(ms) = number(TRANSFER_TIMEOUT_VAR)? {
            config.transfer_timeout = Duration::from_millis(ms);
        }
        if let Some(workers) = number(BULK_WORKERS_VAR)? {
            if workers == 0 {
                return Err(ConfigError::ZeroWorkers {
                    var: BULK_WORKERS_VAR,
                });
            }
            config.bulk_workers = usize::try_from(workers).unwrap_or(usize::MAX);
        }
        if let Some(ms) = number(LOOKUP_LATENCY_VAR)? {
            config.store_latency.lookup = Duration::from_millis(ms);
        }
        if let Some(ms) = number(UPDATE_LATENCY_VAR)? {
            config.store_latency.update = Duration::from_millis(ms);
        }
        Ok(config)
    }
}
