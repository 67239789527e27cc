//! Platforms and fleet state.
//!
//! A [`Platform`] is a tracked mobile entity of one of two classes: ground
//! (wheeled/tracked, rides at a fixed height above the terrain) or aerial
//! (free altitude). Platforms are created at registration and never
//! implicitly destroyed; only the orchestrator and the motion model mutate
//! them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Velocity};

/// The two platform classes the fleet supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformClass {
    /// Ground vehicle – altitude clamped to ride height.
    Ground,
    /// Aerial vehicle – free altitude within the world box.
    Aerial,
}

impl std::fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformClass::Ground => write!(f, "ground"),
            PlatformClass::Aerial => write!(f, "aerial"),
        }
    }
}

/// Operational status of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformStatus {
    Idle,
    Moving,
    /// Running a non-movement command (orbit, spotlight, laser).
    Executing,
    Holding,
    Error,
    /// Comms timeout exceeded.
    Offline,
}

/// A tracked mobile platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub class: PlatformClass,
    pub position: Position,
    pub velocity: Velocity,
    /// Heading in radians; for ground platforms this follows the direction
    /// of travel, for aerial platforms it is a stored orientation.
    pub heading_rad: f64,
    pub status: PlatformStatus,
    pub battery_pct: f64,
    pub health_ok: bool,
    /// Wall-clock time of the most recent heartbeat. Refreshed on every
    /// state change and by the orchestrator's background refresher.
    pub last_heartbeat: DateTime<Utc>,
}

impl Platform {
    /// Create an idle, healthy platform with a fresh heartbeat.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class: PlatformClass,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class,
            position,
            velocity: Velocity::default(),
            heading_rad: 0.0,
            status: PlatformStatus::Idle,
            battery_pct: 100.0,
            health_ok: true,
            last_heartbeat: Utc::now(),
        }
    }

    /// Seconds elapsed since the last heartbeat.
    pub fn seconds_since_heartbeat(&self) -> f64 {
        let delta = Utc::now() - self.last_heartbeat;
        delta.num_milliseconds() as f64 / 1000.0
    }

    /// Reset the heartbeat to now.
    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat = Utc::now();
    }
}

/// Snapshot of every tracked platform, keyed by unique platform id.
///
/// A `FleetState` handed to the constraints engine is a read view; the
/// engine never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetState {
    pub platforms: HashMap<String, Platform>,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_platform(&self, platform_id: &str) -> Option<&Platform> {
        self.platforms.get(platform_id)
    }

    pub fn get_platform_mut(&mut self, platform_id: &str) -> Option<&mut Platform> {
        self.platforms.get_mut(platform_id)
    }

    /// Register or replace a platform under its id.
    pub fn insert(&mut self, platform: Platform) {
        self.platforms.insert(platform.id.clone(), platform);
    }

    /// Ids of all platforms of the given class.
    pub fn ids_of_class(&self, class: PlatformClass) -> Vec<String> {
        let mut ids: Vec<String> = self
            .platforms
            .values()
            .filter(|p| p.class == class)
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Ids of every platform, sorted for deterministic iteration.
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.platforms.keys().cloned().collect();
        ids.sort();
        ids
    }
}
