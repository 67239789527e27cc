//! Closed-loop kinematic motion backend.
//!
//! Each platform carries a [`ControlMode`] that its handler selected; every
//! [`step`][KinematicMotion::step] runs the matching control law to produce a
//! desired velocity, then integrates position with explicit forward Euler
//! (`position += velocity · dt`). Ground platforms clamp altitude to their
//! ride height after every update.
//!
//! The laws are deliberately simple:
//!
//! - **go_to** – proportional slow-down (`speed = min(max_speed, distance)`)
//!   with per-tick acceleration limiting; arrival inside the class arrival
//!   radius pops the next waypoint or drops back to idle.
//! - **hold** – low-gain proportional correction toward the hold point,
//!   capped at a slow speed, so the platform resists drift without being
//!   rigidly locked.
//! - **orbit** – a phase angle advances by `angular_speed · dt`; once near
//!   the circle the velocity becomes the tangential vector, which yields
//!   smooth circular travel instead of radial hunting.
//! - **follow** – target is the leader position minus the gap along the
//!   leader's heading.
//! - **formation** – target is the leader position plus a fixed offset.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};
use vanguard_types::{PlatformClass, PlatformStatus, Position, Velocity};

use crate::backend::{MotionBackend, Pose};
use crate::profile::MotionProfiles;

/// Gain for the hold-position correction.
const HOLD_GAIN: f64 = 2.0;
/// Speed cap for hold corrections, m/s.
const HOLD_MAX_SPEED: f64 = 1.0;
/// Distance below which follow/formation matches the leader velocity.
const STATION_RADIUS: f64 = 0.1;

/// Per-platform control mode. Transitions are driven by handler calls, never
/// by the model itself (except go-to arrival, which resets to idle).
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMode {
    Idle,
    GoTo { waypoints: VecDeque<Position> },
    Hold { point: Position },
    Orbit {
        center: Position,
        radius: f64,
        angular_speed: f64,
        phase: f64,
    },
    Follow { leader: String, gap: f64 },
    Formation { leader: String, offset: Position },
}

struct MotionState {
    class: PlatformClass,
    position: Position,
    velocity: Velocity,
    heading_rad: f64,
    mode: ControlMode,
}

impl MotionState {
    fn status(&self) -> PlatformStatus {
        match self.mode {
            ControlMode::Idle => PlatformStatus::Idle,
            ControlMode::GoTo { .. }
            | ControlMode::Follow { .. }
            | ControlMode::Formation { .. } => PlatformStatus::Moving,
            ControlMode::Hold { .. } => PlatformStatus::Holding,
            ControlMode::Orbit { .. } => PlatformStatus::Executing,
        }
    }
}

/// Snapshot of a leader taken before the mutable update pass.
#[derive(Clone, Copy)]
struct LeaderSnapshot {
    position: Position,
    velocity: Velocity,
    heading_rad: f64,
}

/// The closed-loop kinematic simulation.
pub struct KinematicMotion {
    states: HashMap<String, MotionState>,
    profiles: MotionProfiles,
}

impl Default for KinematicMotion {
    fn default() -> Self {
        Self::new(MotionProfiles::default())
    }
}

impl KinematicMotion {
    pub fn new(profiles: MotionProfiles) -> Self {
        Self {
            states: HashMap::new(),
            profiles,
        }
    }

    /// The active control mode of a platform, mostly for tests and
    /// introspection.
    pub fn mode(&self, id: &str) -> Option<&ControlMode> {
        self.states.get(id).map(|s| &s.mode)
    }

    fn set_mode(&mut self, id: &str, mode: ControlMode) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                state.mode = mode;
                true
            }
            None => false,
        }
    }

    fn update_platform(
        state: &mut MotionState,
        profiles: &MotionProfiles,
        leaders: &HashMap<String, LeaderSnapshot>,
        dt: f64,
    ) {
        let profile = *profiles.for_class(state.class);

        match &mut state.mode {
            ControlMode::Idle => return,

            ControlMode::GoTo { waypoints } => {
                let Some(target) = waypoints.front().copied() else {
                    state.mode = ControlMode::Idle;
                    state.velocity = Velocity::default();
                    return;
                };

                let (dx, dy, dz) = (
                    target.x - state.position.x,
                    target.y - state.position.y,
                    target.z - state.position.z,
                );
                let distance = (dx * dx + dy * dy + dz * dz).sqrt();

                if distance < profile.arrival_radius {
                    waypoints.pop_front();
                    if waypoints.is_empty() {
                        state.mode = ControlMode::Idle;
                        state.velocity = Velocity::default();
                        info!(distance, "platform arrived at target");
                    } else {
                        debug!(remaining = waypoints.len(), "waypoint reached");
                    }
                    return;
                }

                // Proportional slow-down near the target.
                let speed = profile.max_speed.min(distance);
                let desired = Velocity::new(
                    dx / distance * speed,
                    dy / distance * speed,
                    dz / distance * speed,
                );

                // Rate-limit the velocity change by the class acceleration.
                let (dvx, dvy, dvz) = (
                    desired.vx - state.velocity.vx,
                    desired.vy - state.velocity.vy,
                    desired.vz - state.velocity.vz,
                );
                let dv_mag = (dvx * dvx + dvy * dvy + dvz * dvz).sqrt();
                let max_dv = profile.max_accel * dt;
                let scale = if dv_mag > max_dv { max_dv / dv_mag } else { 1.0 };
                state.velocity.vx += dvx * scale;
                state.velocity.vy += dvy * scale;
                state.velocity.vz += dvz * scale;

                if state.class == PlatformClass::Ground && distance > 0.1 {
                    state.heading_rad = dy.atan2(dx);
                }
            }

            ControlMode::Hold { point } => {
                let (dx, dy, dz) = (
                    point.x - state.position.x,
                    point.y - state.position.y,
                    point.z - state.position.z,
                );
                let mut v = Velocity::new(dx * HOLD_GAIN, dy * HOLD_GAIN, dz * HOLD_GAIN);
                let speed = v.speed();
                if speed > HOLD_MAX_SPEED {
                    let k = HOLD_MAX_SPEED / speed;
                    v = Velocity::new(v.vx * k, v.vy * k, v.vz * k);
                }
                state.velocity = v;
            }

            ControlMode::Orbit {
                center,
                radius,
                angular_speed,
                phase,
            } => {
                *phase += *angular_speed * dt;
                let target = Position::new(
                    center.x + *radius * phase.cos(),
                    center.y + *radius * phase.sin(),
                    center.z,
                );
                let (dx, dy, dz) = (
                    target.x - state.position.x,
                    target.y - state.position.y,
                    target.z - state.position.z,
                );
                let distance = (dx * dx + dy * dy + dz * dz).sqrt();

                if distance > 0.1 {
                    // Converge onto the circle, slower than full speed so the
                    // approach stays smooth.
                    let speed = (profile.max_speed * 0.5).min(distance * 2.0);
                    state.velocity = Velocity::new(
                        dx / distance * speed,
                        dy / distance * speed,
                        dz / distance * speed,
                    );
                } else {
                    // On the circle: fly the tangent.
                    let tangential = *angular_speed * *radius;
                    state.velocity = Velocity::new(
                        -phase.sin() * tangential,
                        phase.cos() * tangential,
                        0.0,
                    );
                }
            }

            ControlMode::Follow { leader, gap } => {
                let Some(lead) = leaders.get(leader.as_str()) else {
                    return;
                };
                let target = Position::new(
                    lead.position.x - *gap * lead.heading_rad.cos(),
                    lead.position.y - *gap * lead.heading_rad.sin(),
                    lead.position.z,
                );
                Self::track_point(state, &profile, &target, lead.velocity, 1.5);
            }

            ControlMode::Formation { leader, offset } => {
                let Some(lead) = leaders.get(leader.as_str()) else {
                    return;
                };
                let target = Position::new(
                    lead.position.x + offset.x,
                    lead.position.y + offset.y,
                    lead.position.z + offset.z,
                );
                Self::track_point(state, &profile, &target, lead.velocity, 1.5);
            }
        }

        // Forward-Euler integration.
        state.position.x += state.velocity.vx * dt;
        state.position.y += state.velocity.vy * dt;
        state.position.z += state.velocity.vz * dt;

        if let Some(h) = profile.ride_height {
            state.position.z = h;
        }
    }

    /// Shared follow/formation tracking: close on `target`, and match the
    /// leader's velocity once on station.
    fn track_point(
        state: &mut MotionState,
        profile: &crate::profile::ClassProfile,
        target: &Position,
        leader_velocity: Velocity,
        gain: f64,
    ) {
        let (dx, dy, dz) = (
            target.x - state.position.x,
            target.y - state.position.y,
            target.z - state.position.z,
        );
        let distance = (dx * dx + dy * dy + dz * dz).sqrt();
        if distance > STATION_RADIUS {
            let speed = profile.max_speed.min(distance * gain);
            state.velocity = Velocity::new(
                dx / distance * speed,
                dy / distance * speed,
                dz / distance * speed,
            );
        } else {
            state.velocity = leader_velocity;
        }
    }
}

impl MotionBackend for KinematicMotion {
    fn add_platform(&mut self, id: &str, class: PlatformClass, mut position: Position) {
        if let Some(h) = self.profiles.for_class(class).ride_height {
            position.z = h;
        }
        self.states.insert(
            id.to_string(),
            MotionState {
                class,
                position,
                velocity: Velocity::default(),
                heading_rad: 0.0,
                mode: ControlMode::Idle,
            },
        );
    }

    fn command_go_to(&mut self, id: &str, waypoints: Vec<Position>) -> bool {
        if waypoints.is_empty() {
            return false;
        }
        self.set_mode(
            id,
            ControlMode::GoTo {
                waypoints: waypoints.into_iter().collect(),
            },
        )
    }

    fn command_hold(&mut self, id: &str) -> bool {
        let Some(point) = self.states.get(id).map(|s| s.position) else {
            return false;
        };
        self.set_mode(id, ControlMode::Hold { point })
    }

    fn command_orbit(
        &mut self,
        id: &str,
        center: Position,
        radius_m: f64,
        angular_speed: f64,
    ) -> bool {
        self.set_mode(
            id,
            ControlMode::Orbit {
                center,
                radius: radius_m,
                angular_speed,
                phase: 0.0,
            },
        )
    }

    fn command_follow(&mut self, id: &str, leader: &str, gap_m: f64) -> bool {
        if !self.states.contains_key(leader) {
            return false;
        }
        self.set_mode(
            id,
            ControlMode::Follow {
                leader: leader.to_string(),
                gap: gap_m,
            },
        )
    }

    fn command_formation(&mut self, id: &str, leader: &str, offset: Position) -> bool {
        if !self.states.contains_key(leader) {
            return false;
        }
        self.set_mode(
            id,
            ControlMode::Formation {
                leader: leader.to_string(),
                offset,
            },
        )
    }

    fn command_stop(&mut self, id: &str) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                state.mode = ControlMode::Idle;
                state.velocity = Velocity::default();
                true
            }
            None => false,
        }
    }

    fn pose(&self, id: &str) -> Option<Pose> {
        self.states.get(id).map(|s| Pose {
            position: s.position,
            velocity: s.velocity,
            heading_rad: s.heading_rad,
            status: s.status(),
        })
    }

    fn poses(&self) -> HashMap<String, Pose> {
        self.states
            .keys()
            .filter_map(|id| self.pose(id).map(|p| (id.clone(), p)))
            .collect()
    }

    fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        // Snapshot every platform first so follow/formation read a coherent
        // leader state regardless of update order.
        let leaders: HashMap<String, LeaderSnapshot> = self
            .states
            .iter()
            .map(|(id, s)| {
                (
                    id.clone(),
                    LeaderSnapshot {
                        position: s.position,
                        velocity: s.velocity,
                        heading_rad: s.heading_rad,
                    },
                )
            })
            .collect();

        for state in self.states.values_mut() {
            Self::update_platform(state, &self.profiles, &leaders, dt);
        }
    }
}
