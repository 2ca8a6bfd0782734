//! Static, trial-independent risk scoring of a mission.
use serde::{Deserialize, Serialize};

use crate::constants::{
    HIGH_RISK_WAYPOINT_FACTOR, RISK_DECIMALS, RISK_LEVEL_HIGH_ABOVE, RISK_LEVEL_MEDIUM_ABOVE,
    SEVERITY_WEIGHT_CRITICAL, SEVERITY_WEIGHT_HIGH, SEVERITY_WEIGHT_LOW, SEVERITY_WEIGHT_MEDIUM,
    TYPE_WEIGHT_BATTERY, TYPE_WEIGHT_COMMUNICATION, TYPE_WEIGHT_GPS, TYPE_WEIGHT_MECHANICAL,
    TYPE_WEIGHT_OBSTACLE, TYPE_WEIGHT_SENSOR, TYPE_WEIGHT_WEATHER,
};
use crate::model::{FailureScenario, FailureType, Mission, Severity};
use crate::numbers::{len_to_f64, round_to};

/// Overall mission risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a total risk score. Both thresholds are strict.
    #[must_use]
    pub fn classify(total_risk_score: f64) -> Self {
        if total_risk_score > RISK_LEVEL_HIGH_ABOVE {
            Self::High
        } else if total_risk_score > RISK_LEVEL_MEDIUM_ABOVE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub const fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Low => SEVERITY_WEIGHT_LOW,
        Severity::Medium => SEVERITY_WEIGHT_MEDIUM,
        Severity::High => SEVERITY_WEIGHT_HIGH,
        Severity::Critical => SEVERITY_WEIGHT_CRITICAL,
    }
}

#[must_use]
pub const fn failure_type_weight(failure_type: FailureType) -> f64 {
    match failure_type {
        FailureType::SensorFailure => TYPE_WEIGHT_SENSOR,
        FailureType::MechanicalFailure => TYPE_WEIGHT_MECHANICAL,
        FailureType::CommunicationLoss => TYPE_WEIGHT_COMMUNICATION,
        FailureType::WeatherCondition => TYPE_WEIGHT_WEATHER,
        FailureType::BatteryDrain => TYPE_WEIGHT_BATTERY,
        FailureType::GpsSignalLoss => TYPE_WEIGHT_GPS,
        FailureType::ObstacleDetection => TYPE_WEIGHT_OBSTACLE,
    }
}

/// `probability × severity weight × Σ failure type weights`.
#[must_use]
pub fn scenario_risk(scenario: &FailureScenario) -> f64 {
    let type_weight_sum: f64 = scenario
        .failure_types
        .iter()
        .map(|ft| failure_type_weight(*ft))
        .sum();
    scenario.probability * severity_weight(scenario.severity) * type_weight_sum
}

/// Risk score of one waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRisk {
    pub waypoint_id: String,
    pub score: f64,
}

/// Probability-weighted risk exposure of a mission.
///
/// Scores are rounded to three decimals; classification and the high-risk
/// cut use the unrounded total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub total_risk_score: f64,
    pub average_risk_per_waypoint: f64,
    pub waypoint_risks: Vec<WaypointRisk>,
    pub high_risk_waypoints: Vec<String>,
    pub risk_level: RiskLevel,
}

impl RiskReport {
    #[must_use]
    pub fn score_for(&self, waypoint_id: &str) -> Option<f64> {
        self.waypoint_risks
            .iter()
            .find(|risk| risk.waypoint_id == waypoint_id)
            .map(|risk| risk.score)
    }
}

/// Score every waypoint of `mission` and classify the mission.
///
/// # Panics
///
/// Panics when the mission has no waypoints or a scenario references a
/// waypoint outside the route. Validated missions trip neither.
#[must_use]
pub fn analyze_mission_risk(mission: &Mission) -> RiskReport {
    assert!(
        !mission.waypoints.is_empty(),
        "risk analysis requires at least one waypoint (mission {})",
        mission.id
    );
    mission.assert_scenario_references();

    let raw: Vec<(&str, f64)> = mission
        .waypoints
        .iter()
        .map(|wp| {
            let score = mission
                .scenarios_affecting(&wp.id)
                .map(scenario_risk)
                .fold(0.0_f64, |acc, risk| acc + risk);
            (wp.id.as_str(), score)
        })
        .collect();

    let total = raw.iter().fold(0.0_f64, |acc, (_, score)| acc + *score);
    let average = total / len_to_f64(mission.waypoints.len());
    let high_risk_cut = average * HIGH_RISK_WAYPOINT_FACTOR;

    let waypoint_risks = raw
        .iter()
        .map(|(id, score)| WaypointRisk {
            waypoint_id: (*id).to_string(),
            score: round_to(*score, RISK_DECIMALS),
        })
        .collect::<Vec<_>>();

    // rounded scores against the unrounded cut
    let high_risk_waypoints = waypoint_risks
        .iter()
        .filter(|risk| risk.score > high_risk_cut)
        .map(|risk| risk.waypoint_id.clone())
        .collect();

    RiskReport {
        total_risk_score: round_to(total, RISK_DECIMALS),
        average_risk_per_waypoint: round_to(average, RISK_DECIMALS),
        waypoint_risks,
        high_risk_waypoints,
        risk_level: RiskLevel::classify(total),
    }
}
