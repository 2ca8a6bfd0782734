//! Run-level counters accumulated over the trials of one simulation.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counts::OrderedCounts;
use crate::model::{FailureType, Mission, Severity};
use crate::trial::TrialOutcome;

/// One fired (scenario, failure type) pair of a failed trial.
///
/// Exporters write these rows straight to CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// 1-based trial ordinal within the run.
    pub run_number: u64,
    pub waypoint_id: String,
    pub waypoint_name: String,
    pub scenario_id: String,
    pub scenario_name: String,
    pub failure_type: FailureType,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Mutable counter set owned by a single simulation run.
///
/// Every key that can occur is seeded with zero up front so summaries always
/// carry a complete key set. Waypoint and scenario counters are seeded in
/// mission order, which lets trial outcomes address them by index.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationAccumulator {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub waypoint_failures: OrderedCounts<String>,
    pub failure_type_counts: OrderedCounts<FailureType>,
    pub severity_counts: OrderedCounts<Severity>,
    pub scenario_triggers: OrderedCounts<String>,
    pub detailed_failures: Vec<FailureRecord>,
}

impl SimulationAccumulator {
    #[must_use]
    pub fn new(mission: &Mission) -> Self {
        let mut waypoint_failures = OrderedCounts::new();
        for wp in &mission.waypoints {
            waypoint_failures.seed(wp.id.clone());
        }

        let mut failure_type_counts = OrderedCounts::new();
        let mut severity_counts = OrderedCounts::new();
        let mut scenario_triggers = OrderedCounts::new();
        for scenario in &mission.failure_scenarios {
            for failure_type in &scenario.failure_types {
                failure_type_counts.seed(*failure_type);
            }
            severity_counts.seed(scenario.severity);
            scenario_triggers.seed(scenario.id.clone());
        }

        Self {
            total_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            waypoint_failures,
            failure_type_counts,
            severity_counts,
            scenario_triggers,
            detailed_failures: Vec::new(),
        }
    }

    /// Fold one trial into the counters.
    ///
    /// # Panics
    ///
    /// Panics when the outcome refers to a waypoint or scenario that was not
    /// seeded from `mission`, which means the accumulator and the outcome
    /// were built from different missions.
    pub fn record(
        &mut self,
        run_number: u64,
        outcome: &TrialOutcome,
        mission: &Mission,
        timestamp: DateTime<Utc>,
    ) {
        self.total_runs += 1;
        let Some(failure) = outcome.failure.as_ref() else {
            self.successful_runs += 1;
            return;
        };
        self.failed_runs += 1;

        let waypoint = &mission.waypoints[failure.waypoint_index];
        assert!(
            self.waypoint_failures.add_at(failure.waypoint_index, 1),
            "waypoint {} was not seeded in this accumulator",
            waypoint.id
        );

        for &scenario_index in &failure.fired {
            let scenario = &mission.failure_scenarios[scenario_index];
            assert!(
                self.scenario_triggers.add_at(scenario_index, 1),
                "scenario {} was not seeded in this accumulator",
                scenario.id
            );
            assert!(
                self.severity_counts.add(&scenario.severity, 1),
                "severity {} was not seeded in this accumulator",
                scenario.severity
            );
            for &failure_type in &scenario.failure_types {
                assert!(
                    self.failure_type_counts.add(&failure_type, 1),
                    "failure type {failure_type} was not seeded in this accumulator"
                );
                self.detailed_failures.push(FailureRecord {
                    run_number,
                    waypoint_id: waypoint.id.clone(),
                    waypoint_name: waypoint.name.clone(),
                    scenario_id: scenario.id.clone(),
                    scenario_name: scenario.name.clone(),
                    failure_type,
                    severity: scenario.severity,
                    timestamp,
                });
            }
        }
    }

    /// Fold a partial accumulator for the same mission into this one.
    ///
    /// Detailed records of `other` are appended after the existing ones, so
    /// merging partials in trial order keeps records in trial order.
    ///
    /// # Panics
    ///
    /// Panics when `other` carries a key this accumulator was not seeded with.
    pub fn merge(&mut self, other: Self) {
        self.total_runs += other.total_runs;
        self.successful_runs += other.successful_runs;
        self.failed_runs += other.failed_runs;
        merge_counts(&mut self.waypoint_failures, &other.waypoint_failures, "waypoint");
        merge_counts(
            &mut self.failure_type_counts,
            &other.failure_type_counts,
            "failure type",
        );
        merge_counts(&mut self.severity_counts, &other.severity_counts, "severity");
        merge_counts(&mut self.scenario_triggers, &other.scenario_triggers, "scenario");
        self.detailed_failures.extend(other.detailed_failures);
    }

    /// Total scenario firings across all trials.
    #[must_use]
    pub fn total_failures_triggered(&self) -> u64 {
        self.scenario_triggers.total()
    }
}

fn merge_counts<K: PartialEq + std::fmt::Debug>(
    into: &mut OrderedCounts<K>,
    from: &OrderedCounts<K>,
    what: &str,
) {
    for (key, count) in from.iter() {
        assert!(
            into.add(key, count),
            "{what} {key:?} missing from merge target"
        );
    }
}
