//! Timeline events.
//!
//! Every task transition, platform state change, and constraint violation is
//! recorded as an immutable [`TimelineEvent`]. Events are appended to the
//! orchestrator's bounded ring and broadcast to subscribers; they are never
//! edited after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of events that appear on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskStarted,
    TaskProgress,
    TaskSucceeded,
    TaskFailed,
    TaskCancelled,
    PlatformStateChanged,
    ConstraintViolation,
    System,
}

/// An immutable entry on the orchestrator timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Free-form structured payload.
    pub data: serde_json::Value,
    pub task_id: Option<Uuid>,
    pub platform_id: Option<String>,
}

impl TimelineEvent {
    /// Create an event stamped now, unattached to any task or platform.
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            data,
            task_id: None,
            platform_id: None,
        }
    }

    pub fn with_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_platform(mut self, platform_id: impl Into<String>) -> Self {
        self.platform_id = Some(platform_id.into());
        self
    }
}
