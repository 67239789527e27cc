//! `vanguard-orchestrator` – Command Orchestrator
//!
//! Converts validated commands into executed actions: every command passes
//! through the constraints engine, becomes exactly one lifecycle-tracked
//! [`Task`][vanguard_types::Task], and is executed strictly in submission
//! order by a single runner that drives the motion backend. Every
//! transition lands on an append-only, bounded timeline that subscribers
//! observe through a fire-and-forget broadcast bus.
//!
//! # Modules
//!
//! - [`orchestrator`] – [`Orchestrator`][orchestrator::Orchestrator]: fleet
//!   state, task table, FIFO runner, heartbeat refresher, and motion tick
//!   loop, wired around one explicitly constructed context (no global
//!   instances).
//! - `handlers` – one handler per command variant, dispatched through an
//!   exhaustive match over the closed command union.
//! - [`timeline`] – [`Timeline`][timeline::Timeline]: the bounded event
//!   ring (oldest evicted past the cap).
//! - [`bus`] – [`TimelineBus`][bus::TimelineBus]: tokio broadcast fan-out
//!   to subscribers; observers can lag or fail without ever blocking task
//!   execution.
//! - [`dwell`] – [`DwellTimer`][dwell::DwellTimer] and
//!   [`CancelToken`][dwell::CancelToken]: bounded, cancellable in-handler
//!   suspension, so cancellation support never touches handler logic.

pub mod bus;
pub mod dwell;
mod handlers;
pub mod orchestrator;
pub mod timeline;

pub use bus::TimelineBus;
pub use dwell::{CancelToken, DwellOutcome, DwellTimer};
pub use orchestrator::{Orchestrator, OrchestratorConfig, StatusSnapshot, TaskCounts};
pub use timeline::{DEFAULT_TIMELINE_CAP, Timeline};
