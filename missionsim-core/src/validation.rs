//! Mission invariants checked before a mission is handed to the simulator.
use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Mission, WaypointType};

/// Errors raised when a mission violates a model invariant.
#[derive(Debug, Error, PartialEq)]
pub enum MissionError {
    #[error("mission name must not be empty")]
    EmptyName,
    #[error("mission must have at least 2 waypoints (got {count})")]
    TooFewWaypoints { count: usize },
    #[error("duplicate waypoint id: {id}")]
    DuplicateWaypoint { id: String },
    #[error("waypoint {id} has an empty name")]
    UnnamedWaypoint { id: String },
    #[error("mission must have exactly one {kind} waypoint (found {count})")]
    EndpointCount { kind: WaypointType, count: usize },
    #[error("waypoint {id}: {field} {value:.4} outside {min}..={max}")]
    CoordinateRange {
        id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{owner}: {field} must be non-negative (got {value:.4})")]
    Negative {
        owner: String,
        field: &'static str,
        value: f64,
    },
    #[error("duplicate failure scenario id: {id}")]
    DuplicateScenario { id: String },
    #[error("failure scenario {id} has an empty name")]
    UnnamedScenario { id: String },
    #[error("failure scenario {id} must list at least one failure type")]
    NoFailureTypes { id: String },
    #[error("failure scenario {id} must affect at least one waypoint")]
    NoAffectedWaypoints { id: String },
    #[error("failure scenario {id}: probability {value} must be within 0..=1")]
    Probability { id: String, value: f64 },
    #[error("failure scenario {id}: impact score {value} must be within 0..=10")]
    ImpactScore { id: String, value: f64 },
    #[error("failure scenario {scenario} references non-existent waypoint: {waypoint}")]
    UnknownWaypoint { scenario: String, waypoint: String },
    #[error("mission priority {value} must be within 1..=10")]
    Priority { value: u8 },
    #[error("backup path {index} references non-existent waypoint: {waypoint}")]
    UnknownBackupWaypoint { index: usize, waypoint: String },
}

fn non_negative(owner: &str, field: &'static str, value: Option<f64>) -> Result<(), MissionError> {
    match value {
        Some(v) if v < 0.0 || v.is_nan() => Err(MissionError::Negative {
            owner: owner.to_string(),
            field,
            value: v,
        }),
        _ => Ok(()),
    }
}

fn within(
    id: &str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), MissionError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MissionError::CoordinateRange {
            id: id.to_string(),
            field,
            value,
            min,
            max,
        })
    }
}

/// Errors raised when loading a mission document.
#[derive(Debug, Error)]
pub enum MissionLoadError {
    #[error("mission JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mission is invalid: {0}")]
    Invalid(#[from] MissionError),
}

impl Mission {
    /// Parse a mission document and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the mission is invalid.
    pub fn from_json(json: &str) -> Result<Self, MissionLoadError> {
        let mission: Self = serde_json::from_str(json)?;
        mission.validate()?;
        Ok(mission)
    }

    /// Check every model invariant the simulator relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`MissionError`] encountered, checking waypoints
    /// before scenarios and scenarios before mission-level fields.
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.name.trim().is_empty() {
            return Err(MissionError::EmptyName);
        }
        let waypoint_ids = self.validate_waypoints()?;
        self.validate_scenarios(&waypoint_ids)?;

        if !(1..=10).contains(&self.priority) {
            return Err(MissionError::Priority {
                value: self.priority,
            });
        }
        non_negative(&self.id, "estimated_duration", self.estimated_duration)?;

        if let Some(paths) = &self.backup_paths {
            for (index, path) in paths.iter().enumerate() {
                if let Some(missing) = path.iter().find(|id| !waypoint_ids.contains(id.as_str())) {
                    return Err(MissionError::UnknownBackupWaypoint {
                        index,
                        waypoint: missing.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_waypoints(&self) -> Result<HashSet<&str>, MissionError> {
        if self.waypoints.len() < 2 {
            return Err(MissionError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }

        let mut ids = HashSet::with_capacity(self.waypoints.len());
        for wp in &self.waypoints {
            if !ids.insert(wp.id.as_str()) {
                return Err(MissionError::DuplicateWaypoint { id: wp.id.clone() });
            }
            if wp.name.trim().is_empty() {
                return Err(MissionError::UnnamedWaypoint { id: wp.id.clone() });
            }
            within(&wp.id, "x", wp.coordinates.x, -180.0, 180.0)?;
            within(&wp.id, "y", wp.coordinates.y, -90.0, 90.0)?;
            non_negative(&wp.id, "altitude", wp.altitude)?;
            non_negative(&wp.id, "speed_limit", wp.speed_limit)?;
            non_negative(&wp.id, "wait_time", Some(wp.wait_time))?;
        }

        for kind in [WaypointType::Start, WaypointType::End] {
            let count = self
                .waypoints
                .iter()
                .filter(|wp| wp.waypoint_type == kind)
                .count();
            if count != 1 {
                return Err(MissionError::EndpointCount { kind, count });
            }
        }
        Ok(ids)
    }

    fn validate_scenarios(&self, waypoint_ids: &HashSet<&str>) -> Result<(), MissionError> {
        let mut seen = HashSet::with_capacity(self.failure_scenarios.len());
        for scenario in &self.failure_scenarios {
            let id = &scenario.id;
            if !seen.insert(id.as_str()) {
                return Err(MissionError::DuplicateScenario { id: id.clone() });
            }
            if scenario.name.trim().is_empty() {
                return Err(MissionError::UnnamedScenario { id: id.clone() });
            }
            if scenario.failure_types.is_empty() {
                return Err(MissionError::NoFailureTypes { id: id.clone() });
            }
            if scenario.affected_waypoint_ids.is_empty() {
                return Err(MissionError::NoAffectedWaypoints { id: id.clone() });
            }
            if !(0.0..=1.0).contains(&scenario.probability) {
                return Err(MissionError::Probability {
                    id: id.clone(),
                    value: scenario.probability,
                });
            }
            if let Some(score) = scenario.impact_score
                && !(0.0..=10.0).contains(&score)
            {
                return Err(MissionError::ImpactScore {
                    id: id.clone(),
                    value: score,
                });
            }
            non_negative(id, "duration", scenario.duration)?;
            if let Some(missing) = scenario
                .affected_waypoint_ids
                .iter()
                .find(|wp| !waypoint_ids.contains(wp.as_str()))
            {
                return Err(MissionError::UnknownWaypoint {
                    scenario: id.clone(),
                    waypoint: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FailureScenario, FailureType, Severity, Waypoint};

    fn route() -> Mission {
        Mission::new(
            "m1",
            "Route",
            vec![
                Waypoint::new("a", "A", WaypointType::Start),
                Waypoint::new("b", "B", WaypointType::Checkpoint),
                Waypoint::new("c", "C", WaypointType::End),
            ],
        )
    }

    fn scenario(affects: &[&str], probability: f64) -> FailureScenario {
        FailureScenario::new(
            "s1",
            "Gusts",
            &[FailureType::WeatherCondition],
            Severity::Medium,
            affects,
            probability,
        )
    }

    #[test]
    fn accepts_well_formed_mission() {
        let mission = route().with_scenario(scenario(&["b", "c"], 0.3));
        assert_eq!(mission.validate(), Ok(()));
    }

    #[test]
    fn rejects_single_waypoint() {
        let mut mission = route();
        mission.waypoints.truncate(1);
        assert_eq!(
            mission.validate(),
            Err(MissionError::TooFewWaypoints { count: 1 })
        );
    }

    #[test]
    fn requires_exactly_one_start_and_end() {
        let mut missing_end = route();
        missing_end.waypoints[2].waypoint_type = WaypointType::Delivery;
        assert_eq!(
            missing_end.validate(),
            Err(MissionError::EndpointCount {
                kind: WaypointType::End,
                count: 0
            })
        );

        let mut two_starts = route();
        two_starts.waypoints[1].waypoint_type = WaypointType::Start;
        assert_eq!(
            two_starts.validate(),
            Err(MissionError::EndpointCount {
                kind: WaypointType::Start,
                count: 2
            })
        );
    }

    #[test]
    fn rejects_unresolved_scenario_reference() {
        let mission = route().with_scenario(scenario(&["b", "ghost"], 0.3));
        assert_eq!(
            mission.validate(),
            Err(MissionError::UnknownWaypoint {
                scenario: "s1".to_string(),
                waypoint: "ghost".to_string()
            })
        );
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let mission = route().with_scenario(scenario(&["b"], 1.5));
        assert!(matches!(
            mission.validate(),
            Err(MissionError::Probability { .. })
        ));
        let nan = route().with_scenario(scenario(&["b"], f64::NAN));
        assert!(matches!(nan.validate(), Err(MissionError::Probability { .. })));
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_coordinates() {
        let mut dup = route();
        dup.waypoints[1].id = "a".to_string();
        assert_eq!(
            dup.validate(),
            Err(MissionError::DuplicateWaypoint {
                id: "a".to_string()
            })
        );

        let mut far = route();
        far.waypoints[0].coordinates.y = 95.0;
        assert!(matches!(
            far.validate(),
            Err(MissionError::CoordinateRange { field: "y", .. })
        ));
    }

    #[test]
    fn rejects_empty_scenario_sets() {
        let mut no_types = scenario(&["b"], 0.1);
        no_types.failure_types.clear();
        assert!(matches!(
            route().with_scenario(no_types).validate(),
            Err(MissionError::NoFailureTypes { .. })
        ));
        assert!(matches!(
            route().with_scenario(scenario(&[], 0.1)).validate(),
            Err(MissionError::NoAffectedWaypoints { .. })
        ));
    }

    #[test]
    fn from_json_parses_and_validates() {
        let ok = r#"{"id": "m", "name": "Hop", "waypoints": [
            {"id": "a", "name": "A", "waypoint_type": "start"},
            {"id": "b", "name": "B", "waypoint_type": "end"}
        ]}"#;
        assert_eq!(Mission::from_json(ok).unwrap().waypoints.len(), 2);

        let no_end = ok.replace("\"end\"", "\"delivery\"");
        assert!(matches!(
            Mission::from_json(&no_end),
            Err(MissionLoadError::Invalid(MissionError::EndpointCount { .. }))
        ));
        assert!(matches!(
            Mission::from_json("{"),
            Err(MissionLoadError::Parse(_))
        ));
        assert!(matches!(
            Mission::from_json(&ok.replace("\"start\"", "\"launch\"")),
            Err(MissionLoadError::Parse(_))
        ));
    }

    #[test]
    fn checks_priority_and_backup_paths() {
        let mut mission = route();
        mission.priority = 11;
        assert_eq!(mission.validate(), Err(MissionError::Priority { value: 11 }));

        let mut mission = route();
        mission.backup_paths = Some(vec![vec!["a".to_string(), "x".to_string()]]);
        assert!(matches!(
            mission.validate(),
            Err(MissionError::UnknownBackupWaypoint { index: 0, .. })
        ));
    }
}
