//! Centralized scoring weights and thresholds for mission risk analysis.
//!
//! These values are fixed: risk levels and weights can only change through
//! reviewed code changes, never through mission files or run configuration.

// Severity weights ---------------------------------------------------------
pub(crate) const SEVERITY_WEIGHT_LOW: f64 = 0.5;
pub(crate) const SEVERITY_WEIGHT_MEDIUM: f64 = 1.0;
pub(crate) const SEVERITY_WEIGHT_HIGH: f64 = 1.5;
pub(crate) const SEVERITY_WEIGHT_CRITICAL: f64 = 2.0;

// Failure type weights (assumed operational impact) ------------------------
pub(crate) const TYPE_WEIGHT_SENSOR: f64 = 1.0;
pub(crate) const TYPE_WEIGHT_MECHANICAL: f64 = 1.2;
pub(crate) const TYPE_WEIGHT_COMMUNICATION: f64 = 1.3;
pub(crate) const TYPE_WEIGHT_WEATHER: f64 = 1.1;
pub(crate) const TYPE_WEIGHT_BATTERY: f64 = 1.1;
pub(crate) const TYPE_WEIGHT_GPS: f64 = 1.2;
pub(crate) const TYPE_WEIGHT_OBSTACLE: f64 = 1.0;

// Risk classification -------------------------------------------------------
pub(crate) const RISK_LEVEL_HIGH_ABOVE: f64 = 10.0;
pub(crate) const RISK_LEVEL_MEDIUM_ABOVE: f64 = 5.0;
pub(crate) const HIGH_RISK_WAYPOINT_FACTOR: f64 = 1.5;

// Reporting -----------------------------------------------------------------
pub(crate) const PERCENT_DECIMALS: u32 = 2;
pub(crate) const RISK_DECIMALS: u32 = 3;
pub(crate) const QUICK_TOP_FAILURE_TYPES: usize = 3;
pub(crate) const DEFAULT_NUM_SIMULATIONS: u32 = 100;
pub(crate) const DEFAULT_MAX_SIMULATIONS: u32 = 1000;
pub(crate) const DEFAULT_DETAIL_LIMIT: usize = 10;
pub(crate) const DEFAULT_BACKUP_ROUTE_THRESHOLD_PCT: f64 = 15.0;
