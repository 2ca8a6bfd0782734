use missionsim_core::{
    FailureScenario, FailureType, Mission, RiskLevel, Severity, Waypoint, WaypointType,
    analyze_mission_risk, run_simulation_seeded, run_trial,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn five_stop_route() -> Mission {
    Mission::new(
        "route",
        "Five stops",
        vec![
            Waypoint::new("start", "Start", WaypointType::Start),
            Waypoint::new("cp1", "Checkpoint 1", WaypointType::Checkpoint),
            Waypoint::new("cp2", "Checkpoint 2", WaypointType::Checkpoint),
            Waypoint::new("cp3", "Checkpoint 3", WaypointType::Checkpoint),
            Waypoint::new("end", "End", WaypointType::End),
        ],
    )
}

fn everywhere(probability: f64) -> FailureScenario {
    FailureScenario::new(
        "everywhere",
        "Everywhere",
        &[FailureType::SensorFailure],
        Severity::Critical,
        &["start", "cp1", "cp2", "cp3", "end"],
        probability,
    )
}

#[test]
fn scenario_free_mission_always_succeeds() {
    let mission = Mission::new(
        "hop",
        "Hop",
        vec![
            Waypoint::new("a", "A", WaypointType::Start),
            Waypoint::new("b", "B", WaypointType::End),
        ],
    );
    mission.validate().unwrap();

    let result = run_simulation_seeded(&mission, 50, 2024);
    let summary = &result.simulation_summary;
    assert_eq!(summary.successful_runs, 50);
    assert_eq!(summary.failed_runs, 0);
    assert!((summary.success_rate_percentage - 100.0).abs() < f64::EPSILON);
    assert!(result.detailed_failures.is_empty());
    assert!(result.risk_analysis.total_risk_score.abs() < f64::EPSILON);
    assert_eq!(result.risk_analysis.risk_level, RiskLevel::Low);
}

#[test]
fn certain_checkpoint_failure_stops_before_end() {
    let mission = Mission::new(
        "cp",
        "Checkpoint",
        vec![
            Waypoint::new("a", "A", WaypointType::Start),
            Waypoint::new("cp", "Checkpoint", WaypointType::Checkpoint),
            Waypoint::new("z", "Z", WaypointType::End),
        ],
    )
    .with_scenario(FailureScenario::new(
        "jam",
        "Jammer",
        &[FailureType::CommunicationLoss],
        Severity::High,
        &["cp", "z"],
        1.0,
    ));

    for n in [1, 17, 250] {
        let summary = run_simulation_seeded(&mission, n, 5).simulation_summary;
        assert_eq!(summary.failures_at("cp"), Some(n));
        assert_eq!(summary.failures_at("z"), Some(0));
        assert_eq!(summary.failures_at("a"), Some(0));
        assert!((summary.failure_rate_for("cp").unwrap() - 100.0).abs() < f64::EPSILON);
    }
}

#[test]
fn certain_failure_at_first_waypoint() {
    let mut mission = five_stop_route();
    mission.failure_scenarios.push(FailureScenario::new(
        "pad",
        "Pad fault",
        &[FailureType::MechanicalFailure],
        Severity::Low,
        &["start"],
        1.0,
    ));
    let summary = run_simulation_seeded(&mission, 120, 8).simulation_summary;
    assert_eq!(summary.failures_at("start"), Some(120));
    for id in ["cp1", "cp2", "cp3", "end"] {
        assert_eq!(summary.failures_at(id), Some(0), "{id}");
    }
    assert!((summary.failure_rate_percentage - 100.0).abs() < f64::EPSILON);
}

#[test]
fn exact_risk_boundaries_use_strict_comparison() {
    // 5 waypoints × 0.5 × 2.0 × 1.0
    let at_five = five_stop_route().with_scenario(everywhere(0.5));
    let report = analyze_mission_risk(&at_five);
    assert!((report.total_risk_score - 5.0).abs() < f64::EPSILON);
    assert_eq!(report.risk_level, RiskLevel::Low);

    // 5 waypoints × 1.0 × 2.0 × 1.0
    let at_ten = five_stop_route().with_scenario(everywhere(1.0));
    let report = analyze_mission_risk(&at_ten);
    assert!((report.total_risk_score - 10.0).abs() < f64::EPSILON);
    assert_eq!(report.risk_level, RiskLevel::Medium);
    assert!(report.high_risk_waypoints.is_empty());

    let above_ten = five_stop_route()
        .with_scenario(everywhere(1.0))
        .with_scenario(FailureScenario::new(
            "extra",
            "Extra",
            &[FailureType::ObstacleDetection],
            Severity::Low,
            &["cp2"],
            0.1,
        ));
    let report = analyze_mission_risk(&above_ten);
    assert_eq!(report.risk_level, RiskLevel::High);
    assert_eq!(report.high_risk_waypoints, Vec::<String>::new());
}

#[test]
fn trial_executor_accepts_any_rng() {
    let mission = five_stop_route().with_scenario(everywhere(1.0));
    let mut rng = SmallRng::seed_from_u64(1);
    let outcome = run_trial(&mission, &mut rng);
    assert_eq!(
        outcome.failed_waypoint(&mission).map(|wp| wp.id.as_str()),
        Some("start")
    );
}

#[test]
fn shipped_json_mission_runs_end_to_end() {
    let raw = include_str!("../../templates/mission_coastal_patrol.json");
    let mission = Mission::from_json(raw).unwrap();
    let result = run_simulation_seeded(&mission, 400, 99);
    let summary = &result.simulation_summary;
    assert_eq!(summary.successful_runs + summary.failed_runs, 400);
    assert_eq!(summary.waypoint_failure_counts.total(), summary.failed_runs);
    assert_eq!(
        summary.scenario_trigger_counts.total(),
        summary.total_failures_triggered
    );
    assert_eq!(result.risk_analysis.waypoint_risks.len(), mission.waypoints.len());
}

#[test]
#[should_panic(expected = "references unknown waypoint ghost")]
fn seeded_run_refuses_dangling_scenario_targets() {
    let mission = Mission::new(
        "hop",
        "Hop",
        vec![
            Waypoint::new("a", "A", WaypointType::Start),
            Waypoint::new("b", "B", WaypointType::End),
        ],
    )
    .with_scenario(FailureScenario::new(
        "s",
        "Phantom",
        &[FailureType::SensorFailure],
        Severity::High,
        &["ghost"],
        1.0,
    ));
    assert!(mission.validate().is_err());
    let _ = run_simulation_seeded(&mission, 100, 1);
}

#[test]
fn scenario_free_result_has_no_negative_zero() {
    let mission = Mission::new(
        "hop",
        "Hop",
        vec![
            Waypoint::new("a", "A", WaypointType::Start),
            Waypoint::new("b", "B", WaypointType::End),
        ],
    );
    let result = run_simulation_seeded(&mission, 50, 3);
    let json = serde_json::to_string(&result.risk_analysis).unwrap();
    assert!(!json.contains("-0"), "{json}");
    assert!(result.risk_analysis.total_risk_score.is_sign_positive());
}
