//! `vanguard-constraints` – Safety Constraints Engine
//!
//! The hard guardrail layer of the stack. It does not decide; it enforces
//! rules, entirely outside any upstream decision-maker. Every command must
//! pass through [`ConstraintsEngine::check_command`] before the orchestrator
//! will schedule it.
//!
//! Constraints enforced:
//!
//! 1. Known target platform (or a recognised group alias)
//! 2. Communications freshness (heartbeat within the configured timeout)
//! 3. Maximum speed per platform class
//! 4. World boundary limits
//! 5. No-go zone polygons
//! 6. Minimum inter-platform separation (warning, not rejection)
//!
//! # Modules
//!
//! - [`config`] – [`ConstraintsConfig`][config::ConstraintsConfig]: speed
//!   limits, world bounds, zones, separation, comms timeout, rewrite flag.
//! - [`zone`] – [`NoGoZone`][zone::NoGoZone]: 2-D polygon containment,
//!   path-intersection, and the bounding-box detour heuristic.
//! - [`engine`] – [`ConstraintsEngine`][engine::ConstraintsEngine]: the pure
//!   validation entry points (`check_command`, `check_position_safe`,
//!   `get_safe_path`, `try_rewrite_safe`). No hidden state; safe to call
//!   concurrently with scheduling.

pub mod config;
pub mod engine;
pub mod zone;

pub use config::{AvoidPolicy, ConstraintsConfig, SpeedLimits, WorldBounds};
pub use engine::{ConstraintReport, ConstraintVerdict, ConstraintsEngine};
pub use zone::NoGoZone;
