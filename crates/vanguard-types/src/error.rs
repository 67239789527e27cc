//! Global error type.
//!
//! Constraint rejections are deliberately absent here: they never cross the
//! orchestrator boundary as errors. A rejected command becomes a terminal
//! failed task whose error text enumerates every violation found.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised during command validation and handler execution.
///
/// Execution failures stay local to the task that raised them: the task is
/// marked failed and the scheduler keeps running.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FleetError {
    /// Malformed command shape or an unusable target for this command.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A handler failed during execution; prior mutations are not rolled
    /// back.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The target names no registered platform.
    #[error("Unknown platform: '{0}'")]
    UnknownPlatform(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = FleetError::Execution("orbit valid only for aerial-class".to_string());
        assert!(err.to_string().contains("orbit valid only for aerial-class"));

        let err = FleetError::UnknownPlatform("ghost".to_string());
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn error_serde_roundtrip() {
        let err = FleetError::Validation("Patrol requires waypoints".to_string());
        let json = serde_json::to_string(&err).unwrap();
        let back: FleetError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, FleetError::Validation(msg) if msg.contains("waypoints")));
    }
}
