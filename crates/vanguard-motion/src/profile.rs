//! Per-class kinematic limits.

use serde::{Deserialize, Serialize};
use vanguard_types::PlatformClass;

/// Kinematic envelope for one platform class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassProfile {
    /// Maximum speed, m/s.
    pub max_speed: f64,
    /// Maximum acceleration, m/s².
    pub max_accel: f64,
    /// Distance at which a go-to is declared arrived, m. Tighter for ground
    /// than aerial.
    pub arrival_radius: f64,
    /// Fixed altitude the platform rides at; `None` for free-altitude
    /// (aerial) platforms.
    pub ride_height: Option<f64>,
}

/// Profiles for both platform classes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotionProfiles {
    pub ground: ClassProfile,
    pub aerial: ClassProfile,
}

impl Default for MotionProfiles {
    fn default() -> Self {
        Self {
            ground: ClassProfile {
                max_speed: 5.0,
                max_accel: 2.0,
                arrival_radius: 0.5,
                ride_height: Some(0.25),
            },
            aerial: ClassProfile {
                max_speed: 15.0,
                max_accel: 5.0,
                arrival_radius: 1.0,
                ride_height: None,
            },
        }
    }
}

impl MotionProfiles {
    /// The profile that applies to `class`.
    pub fn for_class(&self, class: PlatformClass) -> &ClassProfile {
        match class {
            PlatformClass::Ground => &self.ground,
            PlatformClass::Aerial => &self.aerial,
        }
    }
}
