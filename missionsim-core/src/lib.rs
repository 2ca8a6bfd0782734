//! Mission Failure Simulator
//!
//! Stochastic failure simulation for waypoint missions: repeated trials over a
//! fixed route, run-level failure statistics, and a static probability-weighted
//! risk score. Template loading, history logging and exports sit beside the core
//! behind small traits so front-ends can supply their own storage.

pub mod accumulator;
pub mod advisory;
pub mod config;
mod constants;
pub mod counts;
pub mod export;
pub mod history;
pub mod model;
pub mod numbers;
pub mod risk;
pub mod seed;
pub mod simulation;
pub mod summary;
pub mod templates;
pub mod trial;
pub mod validation;

// Re-export commonly used types
pub use accumulator::{FailureRecord, SimulationAccumulator};
pub use advisory::{Advice, ImpactAction, impact_action, recommend, waypoints_over_threshold};
pub use config::{ConfigError, SimulationConfig};
pub use counts::OrderedCounts;
pub use export::{FailureHeatmap, failures_to_csv};
pub use history::{HistoryEntry, HistoryError, HistoryStore, JsonlHistory, MemoryHistory};
pub use model::{
    Coordinates, FailureScenario, FailureType, Mission, MissionStatus, Severity, Waypoint,
    WaypointType,
};
pub use risk::{RiskLevel, RiskReport, WaypointRisk, analyze_mission_risk};
pub use seed::derive_stream_seed;
pub use simulation::{
    SimulationResult, build_result, run_simulation, run_simulation_parallel,
    run_simulation_seeded, run_with_config, simulate, simulate_parallel,
};
pub use summary::{QuickSummary, SimulationSummary, WaypointRate, summarize};
pub use templates::{DirectoryTemplates, TemplateError, TemplateSource};
pub use trial::{TrialOutcome, TrialPlan, run_trial};
pub use validation::{MissionError, MissionLoadError};

use log::info;
use thiserror::Error;

/// Failure of an engine operation that touches both collaborators.
#[derive(Debug, Error)]
pub enum EngineError<T, H>
where
    T: std::error::Error + 'static,
    H: std::error::Error + 'static,
{
    #[error(transparent)]
    Template(T),
    #[error(transparent)]
    History(H),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Runs missions from a template source and logs results to a history store.
pub struct MissionEngine<T, H>
where
    T: TemplateSource,
    H: HistoryStore,
{
    templates: T,
    history: H,
}

impl<T, H> MissionEngine<T, H>
where
    T: TemplateSource,
    H: HistoryStore,
{
    pub const fn new(templates: T, history: H) -> Self {
        Self { templates, history }
    }

    pub const fn templates(&self) -> &T {
        &self.templates
    }

    pub const fn history(&self) -> &H {
        &self.history
    }

    /// Load a named template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be loaded or is invalid.
    pub fn load_template(&self, name: &str) -> Result<Mission, T::Error> {
        self.templates.load_template(name)
    }

    /// Run a mission under `config` and append the result to history.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is out of bounds or history cannot be written.
    pub fn simulate_and_log(
        &self,
        mission: &Mission,
        config: &SimulationConfig,
    ) -> Result<SimulationResult, EngineError<T::Error, H::Error>> {
        config.validate()?;
        let result = run_with_config(mission, config);
        self.history
            .record(&result)
            .map_err(EngineError::History)?;
        info!("logged run of {} to history", mission.name);
        Ok(result)
    }

    /// Load a template, run it and log the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be loaded, `config` is out of
    /// bounds, or history cannot be written.
    pub fn simulate_template(
        &self,
        name: &str,
        config: &SimulationConfig,
    ) -> Result<SimulationResult, EngineError<T::Error, H::Error>> {
        let mission = self.load_template(name).map_err(EngineError::Template)?;
        self.simulate_and_log(&mission, config)
    }

    /// Most recent logged runs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if history cannot be read.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, H::Error> {
        self.history.recent(limit)
    }
}
