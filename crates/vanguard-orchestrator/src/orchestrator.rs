//! The command orchestrator.
//!
//! Owns fleet state and the task table, validates every command through the
//! constraints engine, executes accepted tasks strictly in submission order
//! through a single runner, and records every transition on the bounded
//! timeline.
//!
//! # Concurrency model
//!
//! One logical scheduler: the task runner, the motion tick loop, and the
//! heartbeat refresher are tokio tasks sharing state through a single
//! `Arc<Mutex<Core>>`. Every mutation completes before the lock is released,
//! and the lock is never held across a dwell or pacing sleep – those are the
//! only suspension points. Tasks therefore complete in submission order and
//! never run concurrently with one another; a long-running handler blocks
//! all later tasks. That serialisation is the scheduler's defining (and
//! limiting) property.
//!
//! The task queue is unbounded: producers are never blocked, and a sustained
//! high submission rate grows the backlog without limit. That scaling risk
//! is deliberate and unmitigated here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vanguard_constraints::{AvoidPolicy, ConstraintsEngine};
use vanguard_motion::{DEFAULT_ORBIT_ANGULAR_SPEED, MotionBackend, TickConfig};
use vanguard_types::{
    Command, CommandTarget, EventKind, FleetState, Platform, PlatformClass, PlatformStatus, Task,
    TaskStatus, TimelineEvent,
};

use crate::bus::TimelineBus;
use crate::dwell::{CancelToken, DwellTimer};
use crate::handlers::HandlerError;
use crate::timeline::{DEFAULT_TIMELINE_CAP, Timeline};

/// Interval between background heartbeat refreshes, seconds.
const HEARTBEAT_REFRESH_S: f64 = 1.0;
/// Ceiling for hold-position dwell, seconds.
const HOLD_DWELL_CAP_S: f64 = 5.0;
/// Ceiling for spotlight/laser dwell, seconds.
const ACTION_DWELL_CAP_S: f64 = 2.0;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Construction-time configuration for [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Policy applied when a go-to path crosses a no-go zone at execution
    /// time.
    pub avoid_policy: AvoidPolicy,
    /// Motion tick cadence.
    pub tick: TickConfig,
    /// Timeline ring capacity.
    pub timeline_cap: usize,
    /// Angular speed used for orbits that do not specify one, rad/s.
    pub orbit_angular_speed: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            avoid_policy: AvoidPolicy::default(),
            tick: TickConfig::default(),
            timeline_cap: DEFAULT_TIMELINE_CAP,
            orbit_angular_speed: DEFAULT_ORBIT_ANGULAR_SPEED,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Status snapshot
// ────────────────────────────────────────────────────────────────────────────

/// Task totals by lifecycle state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Full orchestrator status, exposed to transports and test harnesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub platforms: HashMap<String, Platform>,
    pub tasks: TaskCounts,
    /// The ten most recently created tasks, oldest first.
    pub recent_tasks: Vec<Task>,
    pub timeline_len: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Core (shared mutable state)
// ────────────────────────────────────────────────────────────────────────────

pub(crate) struct Core {
    pub(crate) fleet: FleetState,
    pub(crate) constraints: ConstraintsEngine,
    pub(crate) backend: Box<dyn MotionBackend>,
    pub(crate) avoid_policy: AvoidPolicy,
    pub(crate) orbit_angular_speed: f64,
    pub(crate) tasks: HashMap<Uuid, Task>,
    /// Task ids in creation order, for the recent-task view.
    pub(crate) task_order: Vec<Uuid>,
    pub(crate) cancels: HashMap<Uuid, CancelToken>,
    pub(crate) timeline: Timeline,
    /// Last status seen from the backend per platform, so the tick sync can
    /// emit only on transitions instead of flooding the timeline.
    pub(crate) last_backend_status: HashMap<String, PlatformStatus>,
    bus: TimelineBus,
}

impl Core {
    /// Append to the ring and broadcast. Fire-and-forget: observers can
    /// never block or fail the emitter.
    pub(crate) fn emit(&mut self, event: TimelineEvent) {
        debug!(kind = ?event.kind, "timeline event");
        self.timeline.push(event.clone());
        self.bus.publish(event);
    }

    /// Expand a command target to concrete platform ids.
    pub(crate) fn resolve_targets(&self, target: &CommandTarget) -> Vec<String> {
        match target {
            CommandTarget::All => self.fleet.all_ids(),
            CommandTarget::GroundClass => self.fleet.ids_of_class(PlatformClass::Ground),
            CommandTarget::AerialClass => self.fleet.ids_of_class(PlatformClass::Aerial),
            CommandTarget::Platform(id) => {
                if self.fleet.platforms.contains_key(id) {
                    vec![id.clone()]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Copy one platform's pose out of the backend into the fleet map.
    ///
    /// Positions update silently every call; a status *transition* (as seen
    /// by the backend, e.g. arrival) is propagated and emitted once.
    pub(crate) fn sync_platform(&mut self, id: &str) {
        let Some(pose) = self.backend.pose(id) else {
            return;
        };
        let previous = self.last_backend_status.insert(id.to_string(), pose.status);
        let transitioned = previous != Some(pose.status);

        let Some(platform) = self.fleet.get_platform_mut(id) else {
            return;
        };
        platform.position = pose.position;
        platform.velocity = pose.velocity;
        platform.heading_rad = pose.heading_rad;
        platform.touch_heartbeat();
        if transitioned {
            platform.status = pose.status;
            let event = TimelineEvent::new(
                EventKind::PlatformStateChanged,
                json!({
                    "position": { "x": pose.position.x, "y": pose.position.y, "z": pose.position.z },
                    "status": pose.status,
                }),
            )
            .with_platform(id);
            self.emit(event);
        }
    }

    pub(crate) fn sync_all(&mut self) {
        for id in self.fleet.all_ids() {
            self.sync_platform(&id);
        }
    }

    /// Set a platform status directly, for handlers whose action is not a
    /// motion mode (spotlight, laser). Emits on change.
    pub(crate) fn set_status(&mut self, id: &str, status: PlatformStatus) {
        let Some(platform) = self.fleet.get_platform_mut(id) else {
            return;
        };
        if platform.status == status {
            return;
        }
        platform.status = status;
        platform.touch_heartbeat();
        let position = platform.position;
        let event = TimelineEvent::new(
            EventKind::PlatformStateChanged,
            json!({
                "position": { "x": position.x, "y": position.y, "z": position.z },
                "status": status,
            }),
        )
        .with_platform(id);
        self.emit(event);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Central orchestrator handle. Clones share the same state; construct one
/// per process and pass clones to every consumer – there is no global
/// instance.
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) inner: Arc<Mutex<Core>>,
    pub(crate) bus: TimelineBus,
    pub(crate) queue_tx: mpsc::UnboundedSender<Uuid>,
    queue_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Uuid>>>>,
    loops: Arc<Mutex<Vec<JoinHandle<()>>>>,
    tick: TickConfig,
    pub(crate) hold_dwell: DwellTimer,
    pub(crate) action_dwell: DwellTimer,
}

impl Orchestrator {
    /// Build an orchestrator around a constraints engine and a motion
    /// backend chosen once here; orchestration logic never branches on which
    /// backend is active.
    pub fn new(
        constraints: ConstraintsEngine,
        backend: Box<dyn MotionBackend>,
        config: OrchestratorConfig,
    ) -> Self {
        let bus = TimelineBus::default();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let core = Core {
            fleet: FleetState::new(),
            constraints,
            backend,
            avoid_policy: config.avoid_policy,
            orbit_angular_speed: config.orbit_angular_speed,
            tasks: HashMap::new(),
            task_order: Vec::new(),
            cancels: HashMap::new(),
            timeline: Timeline::new(config.timeline_cap),
            last_backend_status: HashMap::new(),
            bus: bus.clone(),
        };
        info!(policy = ?config.avoid_policy, tick_s = config.tick.tick_s, "orchestrator initialised");
        Self {
            inner: Arc::new(Mutex::new(core)),
            bus,
            queue_tx,
            queue_rx: Arc::new(Mutex::new(Some(queue_rx))),
            loops: Arc::new(Mutex::new(Vec::new())),
            tick: config.tick,
            hold_dwell: DwellTimer::capped_at_secs(HOLD_DWELL_CAP_S),
            action_dwell: DwellTimer::capped_at_secs(ACTION_DWELL_CAP_S),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Platform management
    // ────────────────────────────────────────────────────────────────────

    /// Register a platform with the orchestrator and its motion backend.
    pub async fn register_platform(&self, platform: Platform) {
        let mut core = self.inner.lock().await;
        core.backend
            .add_platform(&platform.id, platform.class, platform.position);

        let mut platform = platform;
        if let Some(pose) = core.backend.pose(&platform.id) {
            // The backend settles ground platforms at ride height.
            platform.position = pose.position;
            platform.status = pose.status;
            core.last_backend_status
                .insert(platform.id.clone(), pose.status);
        }
        platform.touch_heartbeat();

        let id = platform.id.clone();
        core.fleet.insert(platform);
        core.emit(
            TimelineEvent::new(
                EventKind::System,
                json!({ "message": format!("Platform {id} registered") }),
            )
            .with_platform(id.clone()),
        );
        info!(platform = %id, "platform registered");
    }

    /// Current view of one platform.
    pub async fn get_platform(&self, platform_id: &str) -> Option<Platform> {
        self.inner
            .lock()
            .await
            .fleet
            .get_platform(platform_id)
            .cloned()
    }

    // ────────────────────────────────────────────────────────────────────
    // Command processing
    // ────────────────────────────────────────────────────────────────────

    /// Validate `command` and, if accepted, enqueue it for execution.
    ///
    /// Always returns exactly one [`Task`]: a rejected command yields a task
    /// already in `failed` state carrying every violation found; an accepted
    /// command yields a `queued` task handle immediately, and completion is
    /// asynchronous.
    pub async fn execute_command(&self, command: Command) -> Task {
        let mut core = self.inner.lock().await;

        let report = core.constraints.check_command(&command, &core.fleet);
        for w in &report.warnings {
            warn!(warning = %w, "constraint warning");
        }

        if !report.is_approved() {
            let task = Task::rejected(&command, report.rejection_message());
            core.tasks.insert(task.id, task.clone());
            core.task_order.push(task.id);
            let mut event = TimelineEvent::new(
                EventKind::ConstraintViolation,
                json!({
                    "violations": report.violations,
                    "command": command.kind.name(),
                }),
            )
            .with_task(task.id);
            if let Some(pid) = command.target.platform_id() {
                event = event.with_platform(pid);
            }
            core.emit(event);
            info!(command = command.kind.name(), "command rejected by constraints");
            return task;
        }

        let task = Task::queued(&command);
        core.tasks.insert(task.id, task.clone());
        core.task_order.push(task.id);
        core.cancels.insert(task.id, CancelToken::new());

        let mut event = TimelineEvent::new(
            EventKind::TaskCreated,
            json!({
                "command": command.kind.name(),
                "target": command.target.to_string(),
            }),
        )
        .with_task(task.id);
        if let Some(pid) = command.target.platform_id() {
            event = event.with_platform(pid);
        }
        core.emit(event);

        if self.queue_tx.send(task.id).is_err() {
            // The runner is gone (orchestrator stopped); surface that as a
            // terminal failure rather than leaving the task queued forever.
            if let Some(stored) = core.tasks.get_mut(&task.id) {
                stored.mark_failed("scheduler is not running");
            }
            return core.tasks.get(&task.id).cloned().unwrap_or(task);
        }

        info!(task = %task.id, command = task.kind.name(), "task queued");
        task
    }

    /// Request cancellation of a task.
    ///
    /// A queued task is cancelled immediately and skipped by the runner. A
    /// running task is interrupted at its next dwell point; handlers without
    /// a dwell run to completion. Terminal tasks are left untouched.
    pub async fn cancel_task(&self, task_id: Uuid) -> bool {
        let mut core = self.inner.lock().await;
        let Some(task) = core.tasks.get(&task_id) else {
            return false;
        };
        match task.status {
            TaskStatus::Queued => {
                if let Some(task) = core.tasks.get_mut(&task_id) {
                    task.mark_cancelled();
                }
                core.cancels.remove(&task_id);
                let event = TimelineEvent::new(
                    EventKind::TaskCancelled,
                    json!({ "reason": "cancelled while queued" }),
                )
                .with_task(task_id);
                core.emit(event);
                true
            }
            TaskStatus::Running => {
                if let Some(token) = core.cancels.get(&task_id) {
                    token.cancel();
                }
                true
            }
            _ => false,
        }
    }

    /// A copy of one task's current state.
    pub async fn get_task(&self, task_id: Uuid) -> Option<Task> {
        self.inner.lock().await.tasks.get(&task_id).cloned()
    }

    // ────────────────────────────────────────────────────────────────────
    // Introspection
    // ────────────────────────────────────────────────────────────────────

    /// Platform states, task counts by status, the most recent tasks, and
    /// the timeline size.
    pub async fn get_status(&self) -> StatusSnapshot {
        let core = self.inner.lock().await;
        let mut counts = TaskCounts {
            total: core.tasks.len(),
            ..TaskCounts::default()
        };
        for task in core.tasks.values() {
            match task.status {
                TaskStatus::Queued => counts.queued += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Succeeded => counts.succeeded += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
            }
        }
        let skip = core.task_order.len().saturating_sub(10);
        let recent_tasks = core
            .task_order
            .iter()
            .skip(skip)
            .filter_map(|id| core.tasks.get(id).cloned())
            .collect();
        StatusSnapshot {
            platforms: core.fleet.platforms.clone(),
            tasks: counts,
            recent_tasks,
            timeline_len: core.timeline.len(),
        }
    }

    /// The most recent `limit` timeline events, ordered oldest-to-newest.
    pub async fn get_timeline(&self, limit: usize) -> Vec<TimelineEvent> {
        self.inner.lock().await.timeline.recent(limit)
    }

    /// Subscribe to the live event feed.
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.bus.subscribe()
    }

    /// Register an observer callback for timeline events.
    ///
    /// The callback runs on its own forwarding task, decoupled from the
    /// scheduling path: a slow observer lags and loses old events, and a
    /// panicking observer kills only its own forwarder.
    pub async fn on_event<F>(&self, callback: F)
    where
        F: Fn(TimelineEvent) + Send + 'static,
    {
        let mut rx = self.bus.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "event observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.loops.lock().await.push(handle);
    }

    // ────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ────────────────────────────────────────────────────────────────────

    /// Start the task runner, heartbeat refresher, and motion tick loop.
    /// Idempotent: a second call is a no-op.
    pub async fn start(&self) {
        let Some(rx) = self.queue_rx.lock().await.take() else {
            info!("orchestrator already started");
            return;
        };
        let mut loops = self.loops.lock().await;
        loops.push(tokio::spawn(self.clone().run_task_loop(rx)));
        loops.push(tokio::spawn(self.clone().run_heartbeat_loop()));
        loops.push(tokio::spawn(self.clone().run_tick_loop()));
        info!("orchestrator started");
    }

    /// Stop all background loops. Any in-flight task is abandoned where it
    /// stands, without compensating rollback.
    pub async fn stop(&self) {
        let mut loops = self.loops.lock().await;
        for handle in loops.drain(..) {
            handle.abort();
        }
        info!("orchestrator stopped");
    }

    // ────────────────────────────────────────────────────────────────────
    // Background loops
    // ────────────────────────────────────────────────────────────────────

    /// Drain the FIFO queue, one task at a time, strictly in submission
    /// order.
    async fn run_task_loop(self, mut rx: mpsc::UnboundedReceiver<Uuid>) {
        while let Some(task_id) = rx.recv().await {
            let runnable = {
                let core = self.inner.lock().await;
                matches!(
                    core.tasks.get(&task_id),
                    Some(task) if task.status == TaskStatus::Queued
                )
            };
            if !runnable {
                // Cancelled while queued, or unknown; skip.
                continue;
            }
            self.run_task(task_id).await;
        }
    }

    /// Execute one task: mark running, dispatch to its handler, and convert
    /// the outcome into a terminal state. Handler failures are caught here
    /// and never crash the runner loop or affect later tasks.
    async fn run_task(&self, task_id: Uuid) {
        let (kind, target, token) = {
            let mut core = self.inner.lock().await;
            let Some(task) = core.tasks.get_mut(&task_id) else {
                return;
            };
            task.mark_running();
            let kind = task.kind.clone();
            let target = task.target.clone();
            let mut event =
                TimelineEvent::new(EventKind::TaskStarted, json!({ "command": kind.name() }))
                    .with_task(task_id);
            if let Some(pid) = target.platform_id() {
                event = event.with_platform(pid);
            }
            core.emit(event);
            let token = core.cancels.get(&task_id).cloned().unwrap_or_default();
            (kind, target, token)
        };

        let result = self.dispatch(task_id, &kind, &target, &token).await;

        let mut core = self.inner.lock().await;
        core.cancels.remove(&task_id);
        let outcome = {
            let Some(task) = core.tasks.get_mut(&task_id) else {
                return;
            };
            match result {
                Ok(output) => {
                    task.output = output;
                    task.mark_succeeded();
                    TimelineEvent::new(
                        EventKind::TaskSucceeded,
                        json!({ "command": task.kind.name() }),
                    )
                    .with_task(task_id)
                }
                Err(HandlerError::Cancelled) => {
                    task.mark_cancelled();
                    TimelineEvent::new(
                        EventKind::TaskCancelled,
                        json!({ "command": task.kind.name() }),
                    )
                    .with_task(task_id)
                }
                Err(HandlerError::Failed(error)) => {
                    let message = error.to_string();
                    warn!(task = %task_id, error = %message, "task failed");
                    let event = TimelineEvent::new(
                        EventKind::TaskFailed,
                        json!({ "error": message.clone() }),
                    )
                    .with_task(task_id);
                    task.mark_failed(message);
                    event
                }
            }
        };
        core.emit(outcome);
    }

    /// Refresh every platform heartbeat periodically, standing in for a
    /// real telemetry source.
    async fn run_heartbeat_loop(self) {
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(HEARTBEAT_REFRESH_S));
        loop {
            interval.tick().await;
            let mut core = self.inner.lock().await;
            for platform in core.fleet.platforms.values_mut() {
                platform.touch_heartbeat();
            }
        }
    }

    /// Advance the motion backend and sync fleet state each tick. Realtime
    /// mode sleeps out the remainder of the tick; free-running mode yields
    /// without delay.
    async fn run_tick_loop(self) {
        let tick = self.tick;
        loop {
            let started = Instant::now();
            {
                let mut core = self.inner.lock().await;
                core.backend.step(tick.tick_s);
                core.sync_all();
            }
            if tick.realtime {
                let budget = Duration::from_secs_f64(tick.tick_s);
                let remaining = budget.saturating_sub(started.elapsed());
                tokio::time::sleep(remaining).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use vanguard_constraints::ConstraintsConfig;
    use vanguard_motion::{InstantMotion, KinematicMotion, MotionProfiles};
    use vanguard_types::{CommandKind, Position};

    fn engine() -> ConstraintsEngine {
        ConstraintsEngine::new(ConstraintsConfig::default())
    }

    fn orch_with_backend(backend: Box<dyn MotionBackend>, tick: TickConfig) -> Orchestrator {
        Orchestrator::new(
            engine(),
            backend,
            OrchestratorConfig {
                tick,
                ..OrchestratorConfig::default()
            },
        )
    }

    async fn started_orch() -> Orchestrator {
        let orch = orch_with_backend(
            Box::new(InstantMotion::new()),
            TickConfig {
                tick_s: 0.02,
                realtime: true,
            },
        );
        orch.register_platform(Platform::new(
            "ugv1",
            "UGV Alpha",
            PlatformClass::Ground,
            Position::new(0.0, 0.0, 0.0),
        ))
        .await;
        orch.register_platform(Platform::new(
            "uav1",
            "UAV Delta",
            PlatformClass::Aerial,
            Position::new(0.0, 0.0, 15.0),
        ))
        .await;
        orch.start().await;
        orch
    }

    fn go_to(target: &str, x: f64, y: f64, speed: Option<f64>) -> Command {
        Command::new(
            CommandKind::GoTo { x, y, z: None, speed },
            CommandTarget::parse(target),
        )
    }

    async fn wait_terminal(orch: &Orchestrator, task_id: Uuid) -> Task {
        for _ in 0..400 {
            if let Some(task) = orch.get_task(task_id).await
                && task.status.is_terminal()
            {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("task {task_id} never reached a terminal state");
    }

    #[tokio::test]
    async fn rejected_command_yields_terminal_failed_task_without_queueing() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ugv1", 10.0, 10.0, Some(99.0))).await;
        assert_eq!(task.status, TaskStatus::Failed);
        let error = task.error.as_deref().unwrap();
        assert!(error.contains("99"));
        assert!(error.contains('5'));

        let status = orch.get_status().await;
        assert_eq!(status.tasks.failed, 1);
        assert_eq!(status.tasks.queued, 0);
        assert_eq!(status.tasks.running, 0);

        // A constraint-violation event landed on the timeline.
        let events = orch.get_timeline(10).await;
        assert!(events.iter().any(|e| e.kind == EventKind::ConstraintViolation));
        orch.stop().await;
    }

    #[tokio::test]
    async fn unknown_platform_command_fails_immediately() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ghost", 1.0, 1.0, None)).await;
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("ghost"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn every_accepted_command_reaches_a_terminal_state() {
        let orch = started_orch().await;
        let mut ids = Vec::new();
        for n in 0..5 {
            let task = orch
                .execute_command(go_to("ugv1", n as f64, n as f64, None))
                .await;
            ids.push(task.id);
        }
        for id in ids {
            let done = wait_terminal(&orch, id).await;
            assert_eq!(done.status, TaskStatus::Succeeded);
        }
        let status = orch.get_status().await;
        assert_eq!(status.tasks.succeeded, 5);
        assert_eq!(status.tasks.queued + status.tasks.running, 0);
        orch.stop().await;
    }

    #[tokio::test]
    async fn tasks_complete_strictly_in_submission_order() {
        let orch = started_orch().await;
        let first = orch.execute_command(go_to("ugv1", 10.0, 0.0, None)).await;
        let second = orch.execute_command(go_to("uav1", 0.0, 10.0, None)).await;
        wait_terminal(&orch, first.id).await;
        wait_terminal(&orch, second.id).await;

        // Reconstruct the interleaving from the timeline: the first task's
        // terminal event must precede the second task's start.
        let events = orch.get_timeline(100).await;
        let first_done = events
            .iter()
            .position(|e| e.kind == EventKind::TaskSucceeded && e.task_id == Some(first.id))
            .expect("first task succeeded event");
        let second_started = events
            .iter()
            .position(|e| e.kind == EventKind::TaskStarted && e.task_id == Some(second.id))
            .expect("second task started event");
        assert!(
            first_done < second_started,
            "tasks interleaved: {first_done} vs {second_started}"
        );
        orch.stop().await;
    }

    #[tokio::test]
    async fn cancel_queued_task_before_start() {
        // Not started: accepted tasks stay queued, so cancellation from
        // `queued` is observable.
        let orch = orch_with_backend(Box::new(InstantMotion::new()), TickConfig::default());
        orch.register_platform(Platform::new(
            "ugv1",
            "UGV Alpha",
            PlatformClass::Ground,
            Position::new(0.0, 0.0, 0.0),
        ))
        .await;

        let task = orch.execute_command(go_to("ugv1", 5.0, 5.0, None)).await;
        assert_eq!(task.status, TaskStatus::Queued);
        assert!(orch.cancel_task(task.id).await);
        assert_eq!(
            orch.get_task(task.id).await.unwrap().status,
            TaskStatus::Cancelled
        );

        // The runner skips the cancelled task once started.
        orch.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            orch.get_task(task.id).await.unwrap().status,
            TaskStatus::Cancelled
        );
        orch.stop().await;
    }

    #[tokio::test]
    async fn cancel_running_task_interrupts_its_dwell() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::HoldPosition {
                    duration_s: Some(5.0),
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;

        // Wait until the handler is inside its dwell.
        for _ in 0..100 {
            if orch.get_task(task.id).await.unwrap().status == TaskStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(orch.cancel_task(task.id).await);
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Cancelled);
        orch.stop().await;
    }

    #[tokio::test]
    async fn cancelling_a_terminal_task_is_refused() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ugv1", 1.0, 1.0, None)).await;
        wait_terminal(&orch, task.id).await;
        assert!(!orch.cancel_task(task.id).await);
        orch.stop().await;
    }

    #[tokio::test]
    async fn timeline_respects_requested_limit() {
        let orch = started_orch().await;
        for n in 0..8 {
            let t = orch.execute_command(go_to("ugv1", n as f64, 0.0, None)).await;
            wait_terminal(&orch, t.id).await;
        }
        let events = orch.get_timeline(5).await;
        assert_eq!(events.len(), 5);
        // Oldest-to-newest ordering.
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        orch.stop().await;
    }

    #[tokio::test]
    async fn subscribers_receive_task_lifecycle_events() {
        let orch = started_orch().await;
        let mut rx = orch.subscribe();
        let task = orch.execute_command(go_to("ugv1", 2.0, 2.0, None)).await;
        wait_terminal(&orch, task.id).await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if event.task_id == Some(task.id) {
                kinds.push(event.kind);
            }
        }
        assert!(kinds.contains(&EventKind::TaskCreated));
        assert!(kinds.contains(&EventKind::TaskStarted));
        assert!(kinds.contains(&EventKind::TaskSucceeded));
        orch.stop().await;
    }

    #[tokio::test]
    async fn on_event_observer_runs_off_the_scheduling_path() {
        let orch = started_orch().await;
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        orch.on_event(move |event| {
            sink.lock().unwrap().push(event.kind);
        })
        .await;

        let task = orch.execute_command(go_to("ugv1", 3.0, 3.0, None)).await;
        wait_terminal(&orch, task.id).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!seen.lock().unwrap().is_empty());
        orch.stop().await;
    }

    #[tokio::test]
    async fn registration_emits_a_system_event_and_settles_ride_height() {
        let orch = orch_with_backend(Box::new(InstantMotion::new()), TickConfig::default());
        orch.register_platform(Platform::new(
            "ugv9",
            "UGV Niner",
            PlatformClass::Ground,
            Position::new(1.0, 2.0, 9.0),
        ))
        .await;
        let platform = orch.get_platform("ugv9").await.unwrap();
        assert_eq!(platform.position.z, 0.25);
        let events = orch.get_timeline(5).await;
        assert!(events.iter().any(|e| e.kind == EventKind::System));
    }

    #[tokio::test]
    async fn heartbeats_stay_fresh_while_running() {
        let orch = started_orch().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let platform = orch.get_platform("ugv1").await.unwrap();
        assert!(platform.seconds_since_heartbeat() < 1.0);
        orch.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn kinematic_backend_converges_through_the_tick_loop() {
        // Free-running tick: simulated time advances as fast as the loop
        // can spin, so convergence takes milliseconds of wall clock.
        let orch = orch_with_backend(
            Box::new(KinematicMotion::new(MotionProfiles::default())),
            TickConfig {
                tick_s: 0.05,
                realtime: false,
            },
        );
        orch.register_platform(Platform::new(
            "ugv1",
            "UGV Alpha",
            PlatformClass::Ground,
            Position::new(0.0, 0.0, 0.0),
        ))
        .await;
        orch.start().await;

        let task = orch.execute_command(go_to("ugv1", 3.0, 0.0, None)).await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);

        // The task completes when the move is commanded; the platform
        // converges through the background tick loop.
        let target = Position::new(3.0, 0.0, 0.25);
        let mut arrived = false;
        for _ in 0..400 {
            let p = orch.get_platform("ugv1").await.unwrap();
            if p.status == PlatformStatus::Idle && p.position.distance_2d(&target) < 1.0 {
                arrived = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(arrived, "platform never converged on the target");
        orch.stop().await;
    }
}
