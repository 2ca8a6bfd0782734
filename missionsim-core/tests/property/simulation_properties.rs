use missionsim_core::{
    FailureScenario, FailureType, Mission, Severity, Waypoint, WaypointType,
    analyze_mission_risk, run_simulation_parallel, run_simulation_seeded,
};
use proptest::prelude::*;

const SEVERITIES: [Severity; 4] = [
    Severity::Low,
    Severity::Medium,
    Severity::High,
    Severity::Critical,
];

fn route(len: usize) -> Mission {
    let waypoints = (0..len)
        .map(|i| {
            let kind = if i == 0 {
                WaypointType::Start
            } else if i + 1 == len {
                WaypointType::End
            } else {
                WaypointType::Checkpoint
            };
            Waypoint::new(format!("wp{i}"), format!("Waypoint {i}"), kind)
        })
        .collect();
    Mission::new("prop", "Property route", waypoints)
}

fn scenario_strategy(len: usize) -> impl Strategy<Value = (Vec<usize>, usize, usize, f64)> {
    (
        prop::collection::vec(0..len, 1..=len),
        0..FailureType::ALL.len(),
        0..SEVERITIES.len(),
        0.0..=1.0_f64,
    )
}

fn mission_strategy() -> impl Strategy<Value = Mission> {
    (2_usize..8).prop_flat_map(|len| {
        prop::collection::vec(scenario_strategy(len), 0..5).prop_map(move |specs| {
            let mut mission = route(len);
            for (n, (targets, ft, sev, p)) in specs.into_iter().enumerate() {
                let ids: Vec<String> = targets.iter().map(|i| format!("wp{i}")).collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                mission.failure_scenarios.push(FailureScenario::new(
                    format!("s{n}"),
                    format!("Scenario {n}"),
                    &[FailureType::ALL[ft]],
                    SEVERITIES[sev],
                    &refs,
                    p,
                ));
            }
            mission
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runs_partition_into_success_and_failure(
        mission in mission_strategy(),
        n in 0_u64..400,
        seed in any::<u64>(),
    ) {
        prop_assert!(mission.validate().is_ok());
        let summary = run_simulation_seeded(&mission, n, seed).simulation_summary;
        prop_assert_eq!(summary.total_simulations, n);
        prop_assert_eq!(summary.successful_runs + summary.failed_runs, n);
        prop_assert_eq!(summary.waypoint_failure_counts.total(), summary.failed_runs);
        prop_assert!(summary.total_failures_triggered >= summary.failed_runs);
    }

    #[test]
    fn parallel_runs_keep_counter_invariants(
        mission in mission_strategy(),
        n in 0_u64..400,
        seed in any::<u64>(),
        workers in 1_usize..6,
    ) {
        let summary = run_simulation_parallel(&mission, n, seed, workers).simulation_summary;
        prop_assert_eq!(summary.successful_runs + summary.failed_runs, n);
        prop_assert_eq!(summary.waypoint_failure_counts.total(), summary.failed_runs);
    }

    #[test]
    fn risk_is_monotonic_in_probability(
        mission in mission_strategy(),
        bump in 0.0..=1.0_f64,
    ) {
        prop_assume!(!mission.failure_scenarios.is_empty());
        let before = analyze_mission_risk(&mission);
        let mut raised = mission.clone();
        let first = &mut raised.failure_scenarios[0];
        first.probability = (first.probability + bump).min(1.0);
        let after = analyze_mission_risk(&raised);
        prop_assert!(after.total_risk_score >= before.total_risk_score);
        for (a, b) in after.waypoint_risks.iter().zip(&before.waypoint_risks) {
            prop_assert!(a.score >= b.score, "{} dropped", a.waypoint_id);
        }
    }

    #[test]
    fn risk_analysis_is_idempotent(mission in mission_strategy()) {
        prop_assert_eq!(analyze_mission_risk(&mission), analyze_mission_risk(&mission));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn zero_probability_never_fires(n in 0_u64..=10_000, seed in any::<u64>()) {
        let mission = route(4).with_scenario(FailureScenario::new(
            "never",
            "Never",
            &[FailureType::BatteryDrain, FailureType::GpsSignalLoss],
            Severity::Critical,
            &["wp0", "wp1", "wp2", "wp3"],
            0.0,
        ));
        let summary = run_simulation_seeded(&mission, n, seed).simulation_summary;
        prop_assert_eq!(summary.failed_runs, 0);
        prop_assert_eq!(summary.scenario_trigger_counts.get(&"never".to_string()), Some(0));
        prop_assert_eq!(summary.failure_type_counts.total(), 0);
    }
}
