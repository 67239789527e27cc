//! The motion-backend capability interface.
//!
//! The orchestrator owns exactly one `Box<dyn MotionBackend>` selected at
//! construction time. All command handlers talk to that trait object; none
//! of the orchestration logic ever branches on which implementation is
//! active, so a heavier physics backend can be slotted in later without
//! touching the scheduler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vanguard_types::{PlatformClass, PlatformStatus, Position, Velocity};

/// Current pose of one simulated platform, as reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Position,
    pub velocity: Velocity,
    pub heading_rad: f64,
    /// Status derived from the active control mode.
    pub status: PlatformStatus,
}

/// Tick cadence for the motion loop.
///
/// `realtime = true` sleeps to match the wall-clock tick length;
/// `realtime = false` free-runs, yielding between steps without delay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickConfig {
    #[serde(default = "default_tick")]
    pub tick_s: f64,
    #[serde(default = "default_realtime")]
    pub realtime: bool,
}

fn default_tick() -> f64 {
    0.02
}
fn default_realtime() -> bool {
    true
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_s: default_tick(),
            realtime: default_realtime(),
        }
    }
}

/// Capability interface between the orchestrator and a concrete simulation.
///
/// The `command_*` methods return `false` when the platform (or leader) is
/// unknown to the backend; they never panic.
pub trait MotionBackend: Send {
    /// Register a platform with the backend. Replaces any existing state
    /// under the same id.
    fn add_platform(&mut self, id: &str, class: PlatformClass, position: Position);

    /// Move through `waypoints` in order; the last entry is the final
    /// destination.
    fn command_go_to(&mut self, id: &str, waypoints: Vec<Position>) -> bool;

    /// Hold the current position.
    fn command_hold(&mut self, id: &str) -> bool;

    /// Circle `center` (z = orbit altitude) at `radius_m`, advancing
    /// `angular_speed` radians per second.
    fn command_orbit(&mut self, id: &str, center: Position, radius_m: f64, angular_speed: f64)
    -> bool;

    /// Trail `leader` by `gap_m` along the leader's heading.
    fn command_follow(&mut self, id: &str, leader: &str, gap_m: f64) -> bool;

    /// Maintain a fixed `offset` from `leader`.
    fn command_formation(&mut self, id: &str, leader: &str, offset: Position) -> bool;

    /// Immediate stop: zero velocity, mode idle.
    fn command_stop(&mut self, id: &str) -> bool;

    /// Current pose of one platform.
    fn pose(&self, id: &str) -> Option<Pose>;

    /// Poses of every registered platform.
    fn poses(&self) -> HashMap<String, Pose>;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f64);
}
