//! `vanguard-types` – shared data model for the Vanguard fleet stack.
//!
//! Every other crate in the workspace depends on this one and nothing else in
//! the workspace, so the types here must stay free of behaviour that belongs
//! to the constraints engine, the motion model, or the orchestrator.
//!
//! # Modules
//!
//! - [`geometry`] – [`Position`][geometry::Position] and
//!   [`Velocity`][geometry::Velocity], plain metric 3-D vectors.
//! - [`platform`] – [`Platform`][platform::Platform]: a tracked mobile entity
//!   (ground or aerial class) with position, velocity, status, battery, and
//!   heartbeat bookkeeping, plus [`FleetState`][platform::FleetState].
//! - [`command`] – [`Command`][command::Command]: the closed, serde-tagged
//!   union of everything an upstream decision-maker is allowed to request.
//!   Unknown command types fail at deserialisation, never at dispatch.
//! - [`task`] – [`Task`][task::Task]: the lifecycle-tracked execution record
//!   created for exactly one accepted or rejected command.
//! - [`event`] – [`TimelineEvent`][event::TimelineEvent]: an immutable,
//!   ordered record of a state change or violation.
//! - [`error`] – [`FleetError`][error::FleetError]: the global error type
//!   spanning validation, constraint, and execution failures.

pub mod command;
pub mod error;
pub mod event;
pub mod geometry;
pub mod platform;
pub mod task;

pub use command::{Command, CommandKind, CommandTarget, FormationShape, Waypoint};
pub use error::FleetError;
pub use event::{EventKind, TimelineEvent};
pub use geometry::{Position, Velocity};
pub use platform::{FleetState, Platform, PlatformClass, PlatformStatus};
pub use task::{Task, TaskStatus};
