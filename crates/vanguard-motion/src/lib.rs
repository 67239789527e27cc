//! `vanguard-motion` – Kinematic Motion Model
//!
//! Turns a desired control mode (go-to, hold, orbit, follow, formation) into
//! per-tick position and velocity updates for each platform. This crate knows
//! nothing about commands, tasks, or safety rules; the orchestrator drives it
//! through the [`MotionBackend`] capability interface.
//!
//! # Modules
//!
//! - [`profile`] – [`ClassProfile`][profile::ClassProfile]: per-class
//!   kinematic limits (max speed, max acceleration, arrival radius, ground
//!   ride height).
//! - [`backend`] – [`MotionBackend`][backend::MotionBackend]: the capability
//!   interface between the orchestrator and a concrete simulation, plus
//!   [`TickConfig`][backend::TickConfig] for cadence selection.
//! - [`instant`] – [`InstantMotion`][instant::InstantMotion]: state-teleport
//!   backend; commands take effect immediately and `step` is a no-op.
//! - [`kinematic`] – [`KinematicMotion`][kinematic::KinematicMotion]: the
//!   closed-loop controller bank with forward-Euler integration.
//!
//! The orchestrator selects one backend at construction time and never
//! branches on which implementation is active.

pub mod backend;
pub mod instant;
pub mod kinematic;
pub mod profile;

pub use backend::{MotionBackend, Pose, TickConfig};
pub use instant::InstantMotion;
pub use kinematic::{ControlMode, KinematicMotion};
pub use profile::{ClassProfile, MotionProfiles};

/// Angular speed used for orbits when the command does not specify one,
/// rad/s.
pub const DEFAULT_ORBIT_ANGULAR_SPEED: f64 = 0.2;
