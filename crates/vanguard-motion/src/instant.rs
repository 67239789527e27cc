//! State-teleport motion backend.
//!
//! Commands take effect immediately: a go-to lands the platform on its final
//! waypoint, a formation snaps followers into place, and `step` is a no-op.
//! Useful for headless tests and for deployments that only need state
//! bookkeeping, not smooth motion.

use std::collections::HashMap;

use tracing::debug;
use vanguard_types::{PlatformClass, PlatformStatus, Position, Velocity};

use crate::backend::{MotionBackend, Pose};
use crate::profile::MotionProfiles;

struct InstantState {
    class: PlatformClass,
    position: Position,
    heading_rad: f64,
    status: PlatformStatus,
}

/// Backend whose commands resolve instantly.
#[derive(Default)]
pub struct InstantMotion {
    states: HashMap<String, InstantState>,
    profiles: MotionProfiles,
}

impl InstantMotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: MotionProfiles) -> Self {
        Self {
            states: HashMap::new(),
            profiles,
        }
    }

    /// Clamp ground platforms to their ride height.
    fn settle(&self, class: PlatformClass, mut position: Position) -> Position {
        if let Some(h) = self.profiles.for_class(class).ride_height {
            position.z = h;
        }
        position
    }
}

impl MotionBackend for InstantMotion {
    fn add_platform(&mut self, id: &str, class: PlatformClass, position: Position) {
        let position = self.settle(class, position);
        self.states.insert(
            id.to_string(),
            InstantState {
                class,
                position,
                heading_rad: 0.0,
                status: PlatformStatus::Idle,
            },
        );
    }

    fn command_go_to(&mut self, id: &str, waypoints: Vec<Position>) -> bool {
        let Some(destination) = waypoints.last().copied() else {
            return false;
        };
        let Some(class) = self.states.get(id).map(|s| s.class) else {
            return false;
        };
        let settled = self.settle(class, destination);
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        let dx = settled.x - state.position.x;
        let dy = settled.y - state.position.y;
        if dx.hypot(dy) > f64::EPSILON {
            state.heading_rad = dy.atan2(dx);
        }
        state.position = settled;
        state.status = PlatformStatus::Idle;
        debug!(platform = id, x = settled.x, y = settled.y, "instant go_to");
        true
    }

    fn command_hold(&mut self, id: &str) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                state.status = PlatformStatus::Holding;
                true
            }
            None => false,
        }
    }

    fn command_orbit(
        &mut self,
        id: &str,
        center: Position,
        radius_m: f64,
        _angular_speed: f64,
    ) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                // Snap to the orbit entry point on the +x side of the circle.
                state.position = Position::new(center.x + radius_m, center.y, center.z);
                state.status = PlatformStatus::Executing;
                true
            }
            None => false,
        }
    }

    fn command_follow(&mut self, id: &str, leader: &str, gap_m: f64) -> bool {
        let Some((leader_pos, leader_heading)) = self
            .states
            .get(leader)
            .map(|l| (l.position, l.heading_rad))
        else {
            return false;
        };
        let Some((class, own_z)) = self.states.get(id).map(|s| (s.class, s.position.z)) else {
            return false;
        };
        let target = Position::new(
            leader_pos.x - gap_m * leader_heading.cos(),
            leader_pos.y - gap_m * leader_heading.sin(),
            own_z,
        );
        let settled = self.settle(class, target);
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        state.position = settled;
        state.status = PlatformStatus::Idle;
        true
    }

    fn command_formation(&mut self, id: &str, leader: &str, offset: Position) -> bool {
        let Some(leader_pos) = self.states.get(leader).map(|l| l.position) else {
            return false;
        };
        let Some((class, own_z)) = self.states.get(id).map(|s| (s.class, s.position.z)) else {
            return false;
        };
        let target = Position::new(
            leader_pos.x + offset.x,
            leader_pos.y + offset.y,
            own_z + offset.z,
        );
        let settled = self.settle(class, target);
        let Some(state) = self.states.get_mut(id) else {
            return false;
        };
        state.position = settled;
        state.status = PlatformStatus::Idle;
        true
    }

    fn command_stop(&mut self, id: &str) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                state.status = PlatformStatus::Idle;
                true
            }
            None => false,
        }
    }

    fn pose(&self, id: &str) -> Option<Pose> {
        self.states.get(id).map(|s| Pose {
            position: s.position,
            velocity: Velocity::default(),
            heading_rad: s.heading_rad,
            status: s.status,
        })
    }

    fn poses(&self) -> HashMap<String, Pose> {
        self.states
            .keys()
            .filter_map(|id| self.pose(id).map(|p| (id.clone(), p)))
            .collect()
    }

    fn step(&mut self, _dt: f64) {
        // Instant backend has no dynamics.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> InstantMotion {
        let mut b = InstantMotion::new();
        b.add_platform("ugv1", PlatformClass::Ground, Position::new(0.0, 0.0, 0.0));
        b.add_platform("uav1", PlatformClass::Aerial, Position::new(0.0, 0.0, 15.0));
        b
    }

    #[test]
    fn go_to_teleports_to_final_waypoint() {
        let mut b = backend();
        assert!(b.command_go_to(
            "ugv1",
            vec![Position::new(5.0, 5.0, 0.0), Position::new(20.0, 30.0, 0.0)]
        ));
        let pose = b.pose("ugv1").unwrap();
        assert_eq!(pose.position.x, 20.0);
        assert_eq!(pose.position.y, 30.0);
        assert_eq!(pose.status, PlatformStatus::Idle);
    }

    #[test]
    fn ground_platforms_settle_at_ride_height() {
        let mut b = backend();
        b.command_go_to("ugv1", vec![Position::new(20.0, 30.0, 10.0)]);
        assert_eq!(b.pose("ugv1").unwrap().position.z, 0.25);
    }

    #[test]
    fn aerial_platforms_keep_commanded_altitude() {
        let mut b = backend();
        b.command_go_to("uav1", vec![Position::new(20.0, 30.0, 25.0)]);
        assert_eq!(b.pose("uav1").unwrap().position.z, 25.0);
    }

    #[test]
    fn orbit_snaps_to_circle_entry() {
        let mut b = backend();
        b.command_orbit("uav1", Position::new(10.0, -5.0, 20.0), 10.0, 0.2);
        let pose = b.pose("uav1").unwrap();
        assert_eq!(pose.position, Position::new(20.0, -5.0, 20.0));
        assert_eq!(pose.status, PlatformStatus::Executing);
    }

    #[test]
    fn follow_places_follower_behind_leader_heading() {
        let mut b = backend();
        // Leader heads along +x after its go_to.
        b.command_go_to("uav1", vec![Position::new(10.0, 0.0, 15.0)]);
        b.command_follow("ugv1", "uav1", 3.0);
        let pose = b.pose("ugv1").unwrap();
        assert!((pose.position.x - 7.0).abs() < 1e-9);
        assert!(pose.position.y.abs() < 1e-9);
    }

    #[test]
    fn formation_applies_leader_relative_offset() {
        let mut b = backend();
        b.command_formation("ugv1", "uav1", Position::new(-3.0, 1.5, 0.0));
        let pose = b.pose("ugv1").unwrap();
        assert_eq!(pose.position.x, -3.0);
        assert_eq!(pose.position.y, 1.5);
        assert_eq!(pose.position.z, 0.25);
    }

    #[test]
    fn unknown_platform_commands_return_false() {
        let mut b = backend();
        assert!(!b.command_go_to("ghost", vec![Position::new(1.0, 1.0, 0.0)]));
        assert!(!b.command_hold("ghost"));
        assert!(!b.command_stop("ghost"));
        assert!(!b.command_follow("ugv1", "ghost", 3.0));
        assert!(b.pose("ghost").is_none());
    }

    #[test]
    fn step_is_a_no_op() {
        let mut b = backend();
        let before = b.pose("ugv1").unwrap();
        b.step(1.0);
        assert_eq!(b.pose("ugv1").unwrap(), before);
    }
}
