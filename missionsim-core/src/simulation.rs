//! Simulation runs: trial loop, parallel reduction and the combined result.
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::accumulator::{FailureRecord, SimulationAccumulator};
use crate::config::SimulationConfig;
use crate::constants::DEFAULT_DETAIL_LIMIT;
use crate::model::Mission;
use crate::risk::{RiskReport, analyze_mission_risk};
use crate::seed::{chunk_rng, run_rng};
use crate::summary::{SimulationSummary, summarize};
use crate::trial::TrialPlan;

/// Everything a run produces, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub mission_id: String,
    pub mission_name: String,
    /// Seed that reproduces this run, when the generator was seeded by us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub simulation_summary: SimulationSummary,
    pub risk_analysis: RiskReport,
    pub detailed_failures: Vec<FailureRecord>,
    pub timestamp: DateTime<Utc>,
}

/// Run `num_simulations` sequential trials drawing from `rng`.
pub fn simulate<R: Rng + ?Sized>(
    mission: &Mission,
    num_simulations: u64,
    rng: &mut R,
) -> SimulationAccumulator {
    if num_simulations == 0 {
        warn!("mission {}: zero trials requested", mission.id);
    }
    run_range(&TrialPlan::new(mission), 1, num_simulations, rng)
}

fn run_range<R: Rng + ?Sized>(
    plan: &TrialPlan<'_>,
    first_run: u64,
    count: u64,
    rng: &mut R,
) -> SimulationAccumulator {
    let mission = plan.mission();
    let mut acc = SimulationAccumulator::new(mission);
    for run_number in first_run..first_run + count {
        let outcome = plan.run(rng);
        acc.record(run_number, &outcome, mission, Utc::now());
    }
    acc
}

/// Split trials into `workers` contiguous chunks, run them on the rayon pool
/// and merge the partial accumulators in chunk order.
///
/// Each chunk draws from its own stream derived from `seed`, so the result
/// is deterministic for a given `(seed, workers)` pair.
#[must_use]
pub fn simulate_parallel(
    mission: &Mission,
    num_simulations: u64,
    seed: u64,
    workers: usize,
) -> SimulationAccumulator {
    let chunks = chunk_ranges(num_simulations, workers);
    debug!(
        "mission {}: {} trials across {} chunks",
        mission.id,
        num_simulations,
        chunks.len()
    );
    let plan = TrialPlan::new(mission);
    let partials: Vec<SimulationAccumulator> = chunks
        .into_par_iter()
        .enumerate()
        .map(|(index, (first_run, count))| {
            let mut rng = chunk_rng(seed, index);
            run_range(&plan, first_run, count, &mut rng)
        })
        .collect();

    let mut acc = SimulationAccumulator::new(mission);
    for partial in partials {
        acc.merge(partial);
    }
    acc
}

/// `(first_run, count)` pairs covering `1..=total` in at most `workers` chunks.
fn chunk_ranges(total: u64, workers: usize) -> Vec<(u64, u64)> {
    let workers = u64::try_from(workers.max(1)).unwrap_or(u64::MAX);
    let chunks = workers.min(total).max(1);
    let base = total / chunks;
    let remainder = total % chunks;
    let mut first_run = 1;
    (0..chunks)
        .map(|index| {
            let count = base + u64::from(index < remainder);
            let range = (first_run, count);
            first_run += count;
            range
        })
        .collect()
}

/// Assemble the combined result from a finished accumulator.
#[must_use]
pub fn build_result(
    mission: &Mission,
    acc: &SimulationAccumulator,
    seed: Option<u64>,
    detail_limit: usize,
) -> SimulationResult {
    let summary = summarize(acc);
    let risk_analysis = analyze_mission_risk(mission);
    info!(
        "mission {}: {}/{} trials succeeded, risk {}",
        mission.id, summary.successful_runs, summary.total_simulations, risk_analysis.risk_level
    );
    SimulationResult {
        mission_id: mission.id.clone(),
        mission_name: mission.name.clone(),
        seed,
        simulation_summary: summary,
        risk_analysis,
        detailed_failures: acc
            .detailed_failures
            .iter()
            .take(detail_limit)
            .cloned()
            .collect(),
        timestamp: Utc::now(),
    }
}

/// Run trials with a caller-supplied generator and combine summary and risk.
pub fn run_simulation<R: Rng + ?Sized>(
    mission: &Mission,
    num_simulations: u64,
    rng: &mut R,
) -> SimulationResult {
    let acc = simulate(mission, num_simulations, rng);
    build_result(mission, &acc, None, DEFAULT_DETAIL_LIMIT)
}

/// Reproducible sequential run.
#[must_use]
pub fn run_simulation_seeded(mission: &Mission, num_simulations: u64, seed: u64) -> SimulationResult {
    let mut rng = run_rng(seed);
    let acc = simulate(mission, num_simulations, &mut rng);
    build_result(mission, &acc, Some(seed), DEFAULT_DETAIL_LIMIT)
}

/// Reproducible parallel run.
#[must_use]
pub fn run_simulation_parallel(
    mission: &Mission,
    num_simulations: u64,
    seed: u64,
    workers: usize,
) -> SimulationResult {
    let acc = simulate_parallel(mission, num_simulations, seed, workers);
    build_result(mission, &acc, Some(seed), DEFAULT_DETAIL_LIMIT)
}

/// Run according to `config`. A missing seed is drawn from entropy and
/// reported in the result so the run can be replayed.
///
/// Request bounds are the caller's concern; see [`SimulationConfig::validate`].
#[must_use]
pub fn run_with_config(mission: &Mission, config: &SimulationConfig) -> SimulationResult {
    let seed = config.seed.unwrap_or_else(rand::random);
    let trials = u64::from(config.num_simulations);
    let acc = if config.workers > 1 {
        simulate_parallel(mission, trials, seed, config.workers)
    } else {
        simulate(mission, trials, &mut run_rng(seed))
    };
    build_result(mission, &acc, Some(seed), config.detail_limit)
}
