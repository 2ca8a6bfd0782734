//! Mitigation advice derived from a finished run. Text only; routes are never changed.
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BACKUP_ROUTE_THRESHOLD_PCT;
use crate::model::{FailureType, Mission, Severity};
use crate::summary::SimulationSummary;

pub const GENERAL_ADVICE: &str = "Review mission planning for high-risk points.";

/// What a failure of the given severity does to the mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactAction {
    Continue,
    Abort,
}

#[must_use]
pub const fn impact_action(severity: Severity) -> ImpactAction {
    match severity {
        Severity::High | Severity::Critical => ImpactAction::Abort,
        Severity::Low | Severity::Medium => ImpactAction::Continue,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    BackupRoute {
        waypoint_id: String,
        waypoint_name: String,
        failure_rate: f64,
    },
    FailureTypeHint {
        failure_type: FailureType,
        hint: String,
    },
    General {
        hint: String,
    },
}

impl std::fmt::Display for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackupRoute {
                waypoint_id,
                waypoint_name,
                failure_rate,
            } => write!(
                f,
                "Add a backup route around {waypoint_name} ({waypoint_id}): {failure_rate:.2}% of trials failed there."
            ),
            Self::FailureTypeHint { failure_type, hint } => write!(f, "{failure_type}: {hint}"),
            Self::General { hint } => f.write_str(hint),
        }
    }
}

#[must_use]
pub const fn failure_type_hint(failure_type: FailureType) -> &'static str {
    match failure_type {
        FailureType::SensorFailure => "Consider redundant sensors at key waypoints.",
        FailureType::GpsSignalLoss => "Add GPS stabilization fallback.",
        FailureType::CommunicationLoss => "Plan a lost-link procedure and relay coverage.",
        FailureType::BatteryDrain => "Increase reserve capacity or add a charging stop.",
        FailureType::WeatherCondition => "Schedule around forecast windows or add shelter points.",
        FailureType::MechanicalFailure => "Tighten pre-flight inspection and maintenance intervals.",
        FailureType::ObstacleDetection => "Survey the corridor and raise clearance altitude.",
    }
}

/// Waypoint ids whose failure rate is strictly above `threshold_pct`, in mission order.
#[must_use]
pub fn waypoints_over_threshold(summary: &SimulationSummary, threshold_pct: f64) -> Vec<String> {
    summary
        .waypoint_failure_rates
        .iter()
        .filter(|rate| rate.failure_rate > threshold_pct)
        .map(|rate| rate.waypoint_id.clone())
        .collect()
}

/// Backup-route advice for every waypoint over the default threshold, plus a
/// hint for the most common failure type that actually occurred.
#[must_use]
pub fn recommend(mission: &Mission, summary: &SimulationSummary) -> Vec<Advice> {
    let mut advice: Vec<Advice> =
        waypoints_over_threshold(summary, DEFAULT_BACKUP_ROUTE_THRESHOLD_PCT)
            .into_iter()
            .map(|waypoint_id| {
                let waypoint_name = mission
                    .waypoint(&waypoint_id)
                    .map_or_else(|| waypoint_id.clone(), |wp| wp.name.clone());
                let failure_rate = summary.failure_rate_for(&waypoint_id).unwrap_or(0.0);
                Advice::BackupRoute {
                    waypoint_id,
                    waypoint_name,
                    failure_rate,
                }
            })
            .collect();

    if let Some((failure_type, _)) = summary
        .most_common_failure_types
        .iter()
        .find(|(_, count)| *count > 0)
    {
        advice.push(Advice::FailureTypeHint {
            failure_type: *failure_type,
            hint: failure_type_hint(*failure_type).to_string(),
        });
    }

    if advice.is_empty() {
        advice.push(Advice::General {
            hint: GENERAL_ADVICE.to_string(),
        });
    }
    advice
}
