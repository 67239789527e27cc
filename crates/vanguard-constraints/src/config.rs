//! Constraint configuration.
//!
//! All limits are plain serde structs with field-level defaults so they can
//! be loaded straight from a TOML file or constructed in code. The defaults
//! describe a 200 m × 200 m world with a conservative fleet.

use serde::{Deserialize, Serialize};
use vanguard_types::{PlatformClass, Position};

use crate::zone::NoGoZone;

/// Maximum speed per platform class, in m/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedLimits {
    #[serde(default = "default_ground_speed")]
    pub ground: f64,
    #[serde(default = "default_aerial_speed")]
    pub aerial: f64,
}

fn default_ground_speed() -> f64 {
    5.0
}
fn default_aerial_speed() -> f64 {
    15.0
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            ground: default_ground_speed(),
            aerial: default_aerial_speed(),
        }
    }
}

impl SpeedLimits {
    /// The limit that applies to `class`.
    pub fn limit_for(&self, class: PlatformClass) -> f64 {
        match class {
            PlatformClass::Ground => self.ground,
            PlatformClass::Aerial => self.aerial,
        }
    }
}

/// Axis-aligned world bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Ground level.
    pub z_min: f64,
    /// Maximum altitude.
    pub z_max: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            x_min: -100.0,
            x_max: 100.0,
            y_min: -100.0,
            y_max: 100.0,
            z_min: 0.0,
            z_max: 50.0,
        }
    }
}

impl WorldBounds {
    /// `true` when `pos` lies inside the box (boundaries inclusive).
    pub fn contains(&self, pos: &Position) -> bool {
        self.x_min <= pos.x
            && pos.x <= self.x_max
            && self.y_min <= pos.y
            && pos.y <= self.y_max
            && self.z_min <= pos.z
            && pos.z <= self.z_max
    }

    /// Clamp `pos` componentwise into the box.
    pub fn clamp(&self, pos: &Position) -> Position {
        Position::new(
            pos.x.clamp(self.x_min, self.x_max),
            pos.y.clamp(self.y_min, self.y_max),
            pos.z.clamp(self.z_min, self.z_max),
        )
    }
}

/// Policy for handling straight-line paths that cross a no-go zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvoidPolicy {
    /// Reject the command with a descriptive message and a suggested
    /// waypoint.
    #[default]
    Reject,
    /// Insert detour waypoints around the obstructing zone's bounding box.
    Detour,
}

/// Configuration for all safety constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintsConfig {
    /// Minimum separation between any two platforms, in metres.
    #[serde(default = "default_min_separation")]
    pub min_separation_m: f64,

    #[serde(default)]
    pub speed_limits: SpeedLimits,

    #[serde(default)]
    pub world_bounds: WorldBounds,

    #[serde(default)]
    pub no_go_zones: Vec<NoGoZone>,

    /// A platform silent for longer than this is treated as offline and all
    /// commands targeting it are rejected.
    #[serde(default = "default_comms_timeout")]
    pub comms_timeout_s: f64,

    /// When `true`, [`try_rewrite_safe`][crate::ConstraintsEngine::try_rewrite_safe]
    /// may clamp an unsafe command instead of leaving it rejected.
    #[serde(default = "default_allow_rewrite")]
    pub allow_rewrite: bool,
}

fn default_min_separation() -> f64 {
    2.0
}
fn default_comms_timeout() -> f64 {
    5.0
}
fn default_allow_rewrite() -> bool {
    true
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        Self {
            min_separation_m: default_min_separation(),
            speed_limits: SpeedLimits::default(),
            world_bounds: WorldBounds::default(),
            no_go_zones: Vec::new(),
            comms_timeout_s: default_comms_timeout(),
            allow_rewrite: default_allow_rewrite(),
        }
    }
}
