//! Task lifecycle records.
//!
//! Exactly one [`Task`] is created per `execute_command` call, whether the
//! command was accepted or rejected. Status transitions are monotonic:
//! `queued → running → {succeeded | failed}`, with `cancelled` reachable from
//! `queued` or `running` on external request. Terminal states are sticky –
//! the transition methods silently refuse to leave them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::{Command, CommandKind, CommandTarget};

/// Lifecycle states of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// `true` for states a task can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// The lifecycle-tracked execution record for one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// The command variant this task executes.
    pub kind: CommandKind,
    pub target: CommandTarget,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Completion fraction in `[0.0, 1.0]`.
    pub progress: f64,
    /// Handler output data (e.g. a `report_status` snapshot). Not a side
    /// effect on platform state.
    pub output: Option<serde_json::Value>,
}

impl Task {
    /// A fresh task in `queued` state for an accepted command.
    pub fn queued(command: &Command) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: command.kind.clone(),
            target: command.target.clone(),
            status: TaskStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            progress: 0.0,
            output: None,
        }
    }

    /// A task born terminally `failed`, used for rejected commands.
    pub fn rejected(command: &Command, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: command.kind.clone(),
            target: command.target.clone(),
            status: TaskStatus::Failed,
            created_at: now,
            started_at: None,
            completed_at: Some(now),
            error: Some(error.into()),
            progress: 0.0,
            output: None,
        }
    }

    /// `queued → running`. No-op from any other state.
    pub fn mark_running(&mut self) {
        if self.status == TaskStatus::Queued {
            self.status = TaskStatus::Running;
            self.started_at = Some(Utc::now());
        }
    }

    /// `running → succeeded`. No-op once terminal.
    pub fn mark_succeeded(&mut self) {
        if !self.status.is_terminal() {
            self.status = TaskStatus::Succeeded;
            self.progress = 1.0;
            self.completed_at = Some(Utc::now());
        }
    }

    /// `{queued, running} → failed`. No-op once terminal.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        if !self.status.is_terminal() {
            self.status = TaskStatus::Failed;
            self.error = Some(error.into());
            self.completed_at = Some(Utc::now());
        }
    }

    /// `{queued, running} → cancelled`. No-op once terminal.
    pub fn mark_cancelled(&mut self) {
        if !self.status.is_terminal() {
            self.status = TaskStatus::Cancelled;
            self.completed_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go_to_command() -> Command {
        Command::new(
            CommandKind::GoTo {
                x: 1.0,
                y: 2.0,
                z: None,
                speed: None,
            },
            CommandTarget::parse("ugv1"),
        )
    }

    #[test]
    fn queued_task_starts_clean() {
        let task = Task::queued(&go_to_command());
        assert_eq!(task.status, TaskStatus::Queued);
        assert!(task.started_at.is_none());
        assert!(task.error.is_none());
        assert_eq!(task.progress, 0.0);
    }

    #[test]
    fn rejected_task_is_terminal_with_error() {
        let task = Task::rejected(&go_to_command(), "speed 99 exceeds limit 5");
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.status.is_terminal());
        assert!(task.completed_at.is_some());
        assert_eq!(task.error.as_deref(), Some("speed 99 exceeds limit 5"));
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut task = Task::queued(&go_to_command());
        task.mark_running();
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.started_at.is_some());
        task.mark_succeeded();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.progress, 1.0);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn terminal_states_are_sticky() {
        let mut task = Task::queued(&go_to_command());
        task.mark_running();
        task.mark_failed("path blocked");
        // None of these may revert the failure.
        task.mark_succeeded();
        task.mark_cancelled();
        task.mark_running();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("path blocked"));
    }

    #[test]
    fn cancel_from_queued_is_allowed() {
        let mut task = Task::queued(&go_to_command());
        task.mark_cancelled();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.started_at.is_none());
    }

    #[test]
    fn running_cannot_restart() {
        let mut task = Task::queued(&go_to_command());
        task.mark_running();
        let started = task.started_at;
        task.mark_running();
        assert_eq!(task.started_at, started);
    }

    #[test]
    fn task_serde_roundtrip() {
        let task = Task::queued(&go_to_command());
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"status\":\"queued\""));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, task.id);
    }
}
