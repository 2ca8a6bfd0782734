//! Run configuration shared by library callers and the command line.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_DETAIL_LIMIT, DEFAULT_MAX_SIMULATIONS, DEFAULT_NUM_SIMULATIONS};

/// Errors raised when run configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of simulations must be positive")]
    NoSimulations,
    #[error("maximum {max} simulations allowed (requested {requested})")]
    TooManySimulations { requested: u32, max: u32 },
    #[error("max_simulations must be at least 1")]
    ZeroCap,
    #[error("workers must be at least 1")]
    NoWorkers,
}

/// How a simulation run is executed and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_num_simulations")]
    pub num_simulations: u32,
    #[serde(default = "SimulationConfig::default_max_simulations")]
    pub max_simulations: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "SimulationConfig::default_workers")]
    pub workers: usize,
    #[serde(default = "SimulationConfig::default_detail_limit")]
    pub detail_limit: usize,
}

impl SimulationConfig {
    const fn default_num_simulations() -> u32 {
        DEFAULT_NUM_SIMULATIONS
    }

    const fn default_max_simulations() -> u32 {
        DEFAULT_MAX_SIMULATIONS
    }

    const fn default_workers() -> usize {
        1
    }

    const fn default_detail_limit() -> usize {
        DEFAULT_DETAIL_LIMIT
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_num_simulations(mut self, num_simulations: u32) -> Self {
        self.num_simulations = num_simulations;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enforce the request bounds used by the command line.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_simulations == 0 {
            return Err(ConfigError::ZeroCap);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.num_simulations == 0 {
            return Err(ConfigError::NoSimulations);
        }
        if self.num_simulations > self.max_simulations {
            return Err(ConfigError::TooManySimulations {
                requested: self.num_simulations,
                max: self.max_simulations,
            });
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: Self::default_num_simulations(),
            max_simulations: Self::default_max_simulations(),
            seed: None,
            workers: Self::default_workers(),
            detail_limit: Self::default_detail_limit(),
        }
    }
}
