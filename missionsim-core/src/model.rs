//! Mission model: routes, waypoints and the failure scenarios that can hit them.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Free-form metadata attached to missions, waypoints and scenarios.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Failure types carried by a single scenario (rarely more than two).
pub type FailureTypes = SmallVec<[FailureType; 2]>;

/// Role a waypoint plays along the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointType {
    Start,
    Checkpoint,
    Delivery,
    EmergencyLanding,
    End,
}

impl WaypointType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Checkpoint => "checkpoint",
            Self::Delivery => "delivery",
            Self::EmergencyLanding => "emergency_landing",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for WaypointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of failure a scenario represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    SensorFailure,
    WeatherCondition,
    CommunicationLoss,
    BatteryDrain,
    MechanicalFailure,
    GpsSignalLoss,
    ObstacleDetection,
}

impl FailureType {
    pub const ALL: [Self; 7] = [
        Self::SensorFailure,
        Self::WeatherCondition,
        Self::CommunicationLoss,
        Self::BatteryDrain,
        Self::MechanicalFailure,
        Self::GpsSignalLoss,
        Self::ObstacleDetection,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SensorFailure => "sensor_failure",
            Self::WeatherCondition => "weather_condition",
            Self::CommunicationLoss => "communication_loss",
            Self::BatteryDrain => "battery_drain",
            Self::MechanicalFailure => "mechanical_failure",
            Self::GpsSignalLoss => "gps_signal_loss",
            Self::ObstacleDetection => "obstacle_detection",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a failure scenario, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a mission. Informational only; simulations never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

/// Planar position (longitude-like `x`, latitude-like `y`) with optional altitude `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub name: String,
    pub waypoint_type: WaypointType,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_limit: Option<f64>,
    #[serde(default)]
    pub wait_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Waypoint {
    /// Minimal waypoint at the origin.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, waypoint_type: WaypointType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            waypoint_type,
            coordinates: Coordinates::default(),
            altitude: None,
            speed_limit: None,
            wait_time: 0.0,
            description: None,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.coordinates.x = x;
        self.coordinates.y = y;
        self
    }
}

/// A probabilistic failure that may fire at any of its affected waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureScenario {
    pub id: String,
    pub name: String,
    pub failure_types: FailureTypes,
    pub severity: Severity,
    pub affected_waypoint_ids: Vec<String>,
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mitigation_strategies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl FailureScenario {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        failure_types: &[FailureType],
        severity: Severity,
        affected_waypoint_ids: &[&str],
        probability: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            failure_types: failure_types.iter().copied().collect(),
            severity,
            affected_waypoint_ids: affected_waypoint_ids
                .iter()
                .map(|id| (*id).to_string())
                .collect(),
            probability,
            duration: None,
            description: None,
            mitigation_strategies: Vec::new(),
            impact_score: None,
            metadata: Metadata::new(),
        }
    }

    /// Whether this scenario can fire at the given waypoint.
    #[must_use]
    pub fn affects(&self, waypoint_id: &str) -> bool {
        self.affected_waypoint_ids.iter().any(|id| id == waypoint_id)
    }
}

/// An ordered route plus the failure scenarios it is exposed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub failure_scenarios: Vec<FailureScenario>,
    #[serde(default)]
    pub status: MissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_paths: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

const fn default_priority() -> u8 {
    1
}

impl Mission {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            waypoints,
            failure_scenarios: Vec::new(),
            status: MissionStatus::Planned,
            estimated_duration: None,
            priority: default_priority(),
            backup_paths: None,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: FailureScenario) -> Self {
        self.failure_scenarios.push(scenario);
        self
    }

    #[must_use]
    pub fn waypoint(&self, id: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|wp| wp.id == id)
    }

    /// Scenarios that can fire at `waypoint_id`, in declaration order.
    pub fn scenarios_affecting<'a>(
        &'a self,
        waypoint_id: &'a str,
    ) -> impl Iterator<Item = &'a FailureScenario> + 'a {
        self.failure_scenarios
            .iter()
            .filter(move |scenario| scenario.affects(waypoint_id))
    }

    /// Fail fast on scenarios that target waypoints outside the route.
    ///
    /// # Panics
    ///
    /// Panics naming the scenario and the unknown waypoint id. Missions that
    /// passed `validate` never trip this.
    pub fn assert_scenario_references(&self) {
        for scenario in &self.failure_scenarios {
            for waypoint_id in &scenario.affected_waypoint_ids {
                assert!(
                    self.waypoint(waypoint_id).is_some(),
                    "scenario {} references unknown waypoint {waypoint_id} (mission {})",
                    scenario.id,
                    self.id
                );
            }
        }
    }
}
