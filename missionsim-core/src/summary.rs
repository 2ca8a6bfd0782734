//! Percentages and rankings derived from a finished accumulator.
use serde::{Deserialize, Serialize};

use crate::accumulator::SimulationAccumulator;
use crate::constants::{PERCENT_DECIMALS, QUICK_TOP_FAILURE_TYPES};
use crate::counts::OrderedCounts;
use crate::model::{FailureType, Severity};
use crate::numbers::{percentage, round_to};

/// Flattened reporting view of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total_simulations: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub success_rate_percentage: f64,
    pub failure_rate_percentage: f64,
    pub waypoint_failure_counts: OrderedCounts<String>,
    pub waypoint_failure_rates: Vec<WaypointRate>,
    pub failure_type_counts: OrderedCounts<FailureType>,
    pub severity_counts: OrderedCounts<Severity>,
    pub scenario_trigger_counts: OrderedCounts<String>,
    pub most_common_failure_types: Vec<(FailureType, u64)>,
    pub most_common_severities: Vec<(Severity, u64)>,
    pub total_failures_triggered: u64,
    pub detailed_failures_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRate {
    pub waypoint_id: String,
    pub failure_rate: f64,
}

impl SimulationSummary {
    #[must_use]
    pub fn failure_rate_for(&self, waypoint_id: &str) -> Option<f64> {
        self.waypoint_failure_rates
            .iter()
            .find(|rate| rate.waypoint_id == waypoint_id)
            .map(|rate| rate.failure_rate)
    }

    #[must_use]
    pub fn failures_at(&self, waypoint_id: &str) -> Option<u64> {
        self.waypoint_failure_counts.get(&waypoint_id.to_string())
    }

    /// Reduced view with only the headline numbers.
    #[must_use]
    pub fn quick(&self) -> QuickSummary {
        QuickSummary {
            success_rate_percentage: self.success_rate_percentage,
            failure_rate_percentage: self.failure_rate_percentage,
            total_simulations: self.total_simulations,
            waypoint_failure_counts: self.waypoint_failure_counts.clone(),
            most_common_failure_types: self
                .most_common_failure_types
                .iter()
                .take(QUICK_TOP_FAILURE_TYPES)
                .copied()
                .collect(),
        }
    }
}

/// Headline numbers plus the three most common failure types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickSummary {
    pub success_rate_percentage: f64,
    pub failure_rate_percentage: f64,
    pub total_simulations: u64,
    pub waypoint_failure_counts: OrderedCounts<String>,
    pub most_common_failure_types: Vec<(FailureType, u64)>,
}

/// Derive the summary view. Zero trials report 0% success and 100% failure.
#[must_use]
pub fn summarize(acc: &SimulationAccumulator) -> SimulationSummary {
    let total = acc.total_runs;
    let success_rate = percentage(acc.successful_runs, total);

    let waypoint_failure_rates = acc
        .waypoint_failures
        .map_values(|count| round_to(percentage(count, total), PERCENT_DECIMALS))
        .into_iter()
        .map(|(waypoint_id, failure_rate)| WaypointRate {
            waypoint_id,
            failure_rate,
        })
        .collect();

    SimulationSummary {
        total_simulations: total,
        successful_runs: acc.successful_runs,
        failed_runs: acc.failed_runs,
        success_rate_percentage: round_to(success_rate, PERCENT_DECIMALS),
        failure_rate_percentage: round_to(100.0 - success_rate, PERCENT_DECIMALS),
        waypoint_failure_counts: acc.waypoint_failures.clone(),
        waypoint_failure_rates,
        failure_type_counts: acc.failure_type_counts.clone(),
        severity_counts: acc.severity_counts.clone(),
        scenario_trigger_counts: acc.scenario_triggers.clone(),
        most_common_failure_types: acc.failure_type_counts.ranked(),
        most_common_severities: acc.severity_counts.ranked(),
        total_failures_triggered: acc.total_failures_triggered(),
        detailed_failures_count: acc.detailed_failures.len(),
    }
}
