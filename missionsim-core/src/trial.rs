//! Trial executor: one stochastic traversal of a mission's waypoint sequence.
use rand::Rng;
use smallvec::SmallVec;

use crate::model::{FailureScenario, FailureType, Mission, Waypoint};

/// Scenario indices (into `Mission::failure_scenarios`) that fired at one waypoint.
pub type FiredScenarios = SmallVec<[usize; 2]>;

/// Where and why a trial failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialFailure {
    /// Index of the failing waypoint in sequence order.
    pub waypoint_index: usize,
    /// Every scenario that fired at that waypoint, in declaration order.
    pub fired: FiredScenarios,
}

/// Result of a single trial. `failure` is `None` when the route completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialOutcome {
    pub failure: Option<TrialFailure>,
}

impl TrialOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// The (scenario, failure type) pairs that fired, resolved against `mission`.
    pub fn fired_pairs<'m>(
        &self,
        mission: &'m Mission,
    ) -> impl Iterator<Item = (&'m FailureScenario, FailureType)> + 'm {
        let fired = self
            .failure
            .as_ref()
            .map(|f| f.fired.clone())
            .unwrap_or_default();
        fired.into_iter().flat_map(move |idx| {
            let scenario = &mission.failure_scenarios[idx];
            scenario.failure_types.iter().map(move |ft| (scenario, *ft))
        })
    }

    #[must_use]
    pub fn failed_waypoint<'m>(&self, mission: &'m Mission) -> Option<&'m Waypoint> {
        self.failure
            .as_ref()
            .map(|f| &mission.waypoints[f.waypoint_index])
    }
}

/// Per-waypoint exposure table built once per run.
///
/// `exposures[i]` lists the scenarios affecting waypoint `i` in declaration
/// order, so each trial only walks the scenarios that can fire.
#[derive(Debug, Clone)]
pub struct TrialPlan<'m> {
    mission: &'m Mission,
    exposures: Vec<SmallVec<[usize; 4]>>,
}

impl<'m> TrialPlan<'m> {
    /// # Panics
    ///
    /// Panics when a scenario references a waypoint the mission does not have.
    #[must_use]
    pub fn new(mission: &'m Mission) -> Self {
        mission.assert_scenario_references();
        let exposures = mission
            .waypoints
            .iter()
            .map(|wp| {
                mission
                    .failure_scenarios
                    .iter()
                    .enumerate()
                    .filter(|(_, scenario)| scenario.affects(&wp.id))
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();
        Self { mission, exposures }
    }

    #[must_use]
    pub const fn mission(&self) -> &'m Mission {
        self.mission
    }

    /// Execute one trial.
    ///
    /// Waypoints are visited in order. Every scenario exposed at the current
    /// waypoint draws one uniform sample in `[0, 1)` and fires when the
    /// sample is strictly below its probability. The scan stops at the first
    /// waypoint where anything fired.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> TrialOutcome {
        let scenarios = &self.mission.failure_scenarios;
        let failure = self
            .exposures
            .iter()
            .enumerate()
            .find_map(|(waypoint_index, exposed)| {
                let fired: FiredScenarios = exposed
                    .iter()
                    .copied()
                    .filter(|&idx| rng.r#gen::<f64>() < scenarios[idx].probability)
                    .collect();
                (!fired.is_empty()).then_some(TrialFailure {
                    waypoint_index,
                    fired,
                })
            });
        TrialOutcome { failure }
    }
}

/// Convenience wrapper running a single trial without reusing a plan.
pub fn run_trial<R: Rng + ?Sized>(mission: &Mission, rng: &mut R) -> TrialOutcome {
    TrialPlan::new(mission).run(rng)
}
