//! Command handlers.
//!
//! Dispatch is an exhaustive match over the closed [`CommandKind`] union, so
//! there is no unknown-command arm here – unrecognised type tags already
//! failed at deserialisation. Handlers resolve the command target to
//! concrete platform ids, validate execution-time preconditions (path
//! safety, platform class, leader existence), and drive the motion backend.
//!
//! Failure handling: a handler error is caught at the task-execution
//! boundary and marks the task `failed`; platform mutations applied before
//! the error are *not* rolled back, so handlers validate preconditions
//! before mutating state wherever that matters. No handler retries.

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use vanguard_types::{
    CommandKind, CommandTarget, EventKind, FleetError, FormationShape, PlatformClass,
    PlatformStatus, Position, TimelineEvent, Waypoint,
};

use crate::dwell::{CancelToken, DwellOutcome};
use crate::orchestrator::Orchestrator;

/// How a handler ended, before conversion into a terminal task state.
pub(crate) enum HandlerError {
    /// The task's cancel token fired during a dwell.
    Cancelled,
    /// The handler failed; the error's display text becomes the task error.
    Failed(FleetError),
}

type HandlerResult = Result<Option<serde_json::Value>, HandlerError>;

impl Orchestrator {
    /// Route one task to its handler. Exhaustive over the command union.
    pub(crate) async fn dispatch(
        &self,
        task_id: Uuid,
        kind: &CommandKind,
        target: &CommandTarget,
        token: &CancelToken,
    ) -> HandlerResult {
        match kind {
            CommandKind::GoTo { x, y, z, speed: _ } => {
                self.handle_go_to(task_id, target, *x, *y, *z).await
            }
            CommandKind::HoldPosition { duration_s } => {
                self.handle_hold_position(target, *duration_s, token).await
            }
            CommandKind::Stop => self.handle_stop(target).await,
            CommandKind::ReportStatus => self.handle_report_status(target).await,
            CommandKind::FormFormation {
                formation,
                spacing_m,
                leader,
            } => {
                self.handle_form_formation(target, *formation, *spacing_m, leader.as_deref())
                    .await
            }
            CommandKind::FollowLeader { leader, gap_m } => {
                self.handle_follow_leader(target, leader, *gap_m).await
            }
            CommandKind::Orbit {
                center_x,
                center_y,
                radius_m,
                altitude_m,
                angular_speed,
            } => {
                self.handle_orbit(target, *center_x, *center_y, *radius_m, *altitude_m, *angular_speed)
                    .await
            }
            CommandKind::ReturnHome => self.handle_return_home(target).await,
            CommandKind::Spotlight {
                target_x,
                target_y,
                duration_s,
            } => {
                self.handle_pointing("spotlight", target, *target_x, *target_y, *duration_s, token)
                    .await
            }
            CommandKind::PointLaser {
                target_x,
                target_y,
                duration_s,
            } => {
                self.handle_pointing("point_laser", target, *target_x, *target_y, *duration_s, token)
                    .await
            }
            CommandKind::Patrol {
                waypoints,
                loop_route,
            } => self.handle_patrol(target, waypoints, *loop_route).await,
        }
    }

    /// Move to a destination, re-validating the path against no-go zones at
    /// execution time – fleet state may have changed since the command was
    /// accepted.
    async fn handle_go_to(
        &self,
        task_id: Uuid,
        target: &CommandTarget,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> HandlerResult {
        let mut core = self.inner.lock().await;
        let targets = core.resolve_targets(target);

        for id in targets {
            let Some(platform) = core.fleet.get_platform(&id) else {
                continue;
            };
            let start = platform.position;
            let destination = Position::new(x, y, z.unwrap_or(start.z));
            let policy = core.avoid_policy;

            let (waypoints, error) = core.constraints.get_safe_path(&start, &destination, policy);
            if let Some(error) = error {
                let event = TimelineEvent::new(
                    EventKind::ConstraintViolation,
                    json!({ "message": error, "platform": id, "policy": policy }),
                )
                .with_task(task_id)
                .with_platform(id.clone());
                core.emit(event);
                return Err(HandlerError::Failed(FleetError::Execution(error)));
            }

            if waypoints.len() > 1 {
                info!(platform = %id, legs = waypoints.len(), "following detour path");
            }
            core.backend.command_go_to(&id, waypoints);
            core.sync_platform(&id);
            info!(platform = %id, x, y, "go_to commanded");
        }
        Ok(None)
    }

    /// Hold position, optionally for a bounded duration, then release.
    async fn handle_hold_position(
        &self,
        target: &CommandTarget,
        duration_s: Option<f64>,
        token: &CancelToken,
    ) -> HandlerResult {
        let targets = {
            let mut core = self.inner.lock().await;
            let targets = core.resolve_targets(target);
            for id in &targets {
                core.backend.command_hold(id);
                core.sync_platform(id);
            }
            targets
        };

        if let Some(duration) = duration_s {
            // The lock is NOT held across this suspension point.
            if self.hold_dwell.sleep(duration, token).await == DwellOutcome::Cancelled {
                return Err(HandlerError::Cancelled);
            }
            let mut core = self.inner.lock().await;
            for id in &targets {
                core.backend.command_stop(id);
                core.sync_platform(id);
            }
        }
        Ok(None)
    }

    /// Emergency stop: zero velocity, mode idle.
    async fn handle_stop(&self, target: &CommandTarget) -> HandlerResult {
        let mut core = self.inner.lock().await;
        for id in core.resolve_targets(target) {
            core.backend.command_stop(&id);
            core.sync_platform(&id);
            info!(platform = %id, "platform stopped");
        }
        Ok(None)
    }

    /// Snapshot the targeted platforms into the task's output data. No side
    /// effects on platform state.
    async fn handle_report_status(&self, target: &CommandTarget) -> HandlerResult {
        let core = self.inner.lock().await;
        let mut report = serde_json::Map::new();
        for id in core.resolve_targets(target) {
            let Some(p) = core.fleet.get_platform(&id) else {
                continue;
            };
            report.insert(
                id,
                json!({
                    "name": p.name,
                    "class": p.class,
                    "status": p.status,
                    "position": { "x": p.position.x, "y": p.position.y, "z": p.position.z },
                    "battery_pct": p.battery_pct,
                    "health_ok": p.health_ok,
                }),
            );
        }
        Ok(Some(serde_json::Value::Object(report)))
    }

    /// Arrange followers around a leader by formation topology.
    async fn handle_form_formation(
        &self,
        target: &CommandTarget,
        formation: FormationShape,
        spacing_m: f64,
        leader: Option<&str>,
    ) -> HandlerResult {
        let mut core = self.inner.lock().await;
        let targets = core.resolve_targets(target);
        if targets.is_empty() {
            return Ok(None);
        }

        // Explicit leader when it is one of the targets, first target
        // otherwise.
        let leader_id = match leader {
            Some(l) if targets.iter().any(|t| t == l) => l.to_string(),
            _ => targets[0].clone(),
        };
        if core.fleet.get_platform(&leader_id).is_none() {
            return Ok(None);
        }

        let followers: Vec<String> = targets.into_iter().filter(|t| *t != leader_id).collect();
        for (i, follower) in followers.iter().enumerate() {
            let (offset_x, offset_y) = match formation {
                FormationShape::Line => (-spacing_m * (i + 1) as f64, 0.0),
                FormationShape::Wedge => {
                    let side = if i % 2 == 0 { 1.0 } else { -1.0 };
                    let row = (i / 2 + 1) as f64;
                    (-spacing_m * row, side * spacing_m * row * 0.5)
                }
                FormationShape::Column => (0.0, spacing_m * (i + 1) as f64),
            };
            core.backend
                .command_formation(follower, &leader_id, Position::new(offset_x, offset_y, 0.0));
            core.sync_platform(follower);
        }
        info!(?formation, leader = %leader_id, "formation commanded");
        Ok(None)
    }

    /// Convoy: followers trail the leader at increasing gap multiples.
    async fn handle_follow_leader(
        &self,
        target: &CommandTarget,
        leader: &str,
        gap_m: f64,
    ) -> HandlerResult {
        let mut core = self.inner.lock().await;
        if core.fleet.get_platform(leader).is_none() {
            return Err(HandlerError::Failed(FleetError::Execution(format!(
                "Leader '{leader}' not found"
            ))));
        }

        let followers: Vec<String> = core
            .resolve_targets(target)
            .into_iter()
            .filter(|t| t != leader)
            .collect();
        for (i, follower) in followers.iter().enumerate() {
            core.backend
                .command_follow(follower, leader, gap_m * (i + 1) as f64);
            core.sync_platform(follower);
        }
        info!(leader = %leader, gap_m, "convoy commanded");
        Ok(None)
    }

    /// Orbit a point. Aerial platforms only.
    async fn handle_orbit(
        &self,
        target: &CommandTarget,
        center_x: f64,
        center_y: f64,
        radius_m: f64,
        altitude_m: f64,
        angular_speed: Option<f64>,
    ) -> HandlerResult {
        let mut core = self.inner.lock().await;
        let Some(id) = target.platform_id() else {
            return Err(HandlerError::Failed(FleetError::Validation(
                "orbit requires a single platform target".to_string(),
            )));
        };
        let Some(platform) = core.fleet.get_platform(id) else {
            return Err(HandlerError::Failed(FleetError::UnknownPlatform(id.to_string())));
        };
        let class = platform.class;
        if class != PlatformClass::Aerial {
            return Err(HandlerError::Failed(FleetError::Execution(format!(
                "orbit valid only for aerial-class platforms, got {class}"
            ))));
        }

        let omega = angular_speed.unwrap_or(core.orbit_angular_speed);
        core.backend.command_orbit(
            id,
            Position::new(center_x, center_y, altitude_m),
            radius_m,
            omega,
        );
        core.sync_platform(id);
        info!(platform = %id, center_x, center_y, radius_m, altitude_m, "orbit commanded");
        Ok(None)
    }

    /// Return to the origin, preserving current altitude.
    async fn handle_return_home(&self, target: &CommandTarget) -> HandlerResult {
        let mut core = self.inner.lock().await;
        for id in core.resolve_targets(target) {
            let Some(platform) = core.fleet.get_platform(&id) else {
                continue;
            };
            let home = Position::new(0.0, 0.0, platform.position.z);
            core.backend.command_go_to(&id, vec![home]);
            core.sync_platform(&id);
        }
        info!("return home commanded");
        Ok(None)
    }

    /// Shared spotlight / laser behaviour: aim at a ground point for a
    /// bounded, cancellable dwell. Aerial platforms only.
    async fn handle_pointing(
        &self,
        action: &str,
        target: &CommandTarget,
        target_x: f64,
        target_y: f64,
        duration_s: f64,
        token: &CancelToken,
    ) -> HandlerResult {
        let id = {
            let mut core = self.inner.lock().await;
            let Some(id) = target.platform_id() else {
                return Err(HandlerError::Failed(FleetError::Validation(format!(
                    "{action} requires a single platform target"
                ))));
            };
            let Some(platform) = core.fleet.get_platform(id) else {
                return Err(HandlerError::Failed(FleetError::UnknownPlatform(id.to_string())));
            };
            if platform.class != PlatformClass::Aerial {
                return Err(HandlerError::Failed(FleetError::Execution(format!(
                    "{action} valid only for aerial-class platforms"
                ))));
            }
            let id = id.to_string();
            core.set_status(&id, PlatformStatus::Executing);
            info!(platform = %id, action, target_x, target_y, duration_s, "pointing action engaged");
            id
        };

        if self.action_dwell.sleep(duration_s, token).await == DwellOutcome::Cancelled {
            // No rollback: the platform is left as the handler last set it.
            return Err(HandlerError::Cancelled);
        }

        let mut core = self.inner.lock().await;
        core.set_status(&id, PlatformStatus::Idle);
        Ok(None)
    }

    /// Visit a waypoint sequence, validating every leg against no-go zones
    /// before any motion starts.
    async fn handle_patrol(
        &self,
        target: &CommandTarget,
        waypoints: &[Waypoint],
        loop_route: bool,
    ) -> HandlerResult {
        let mut core = self.inner.lock().await;
        let Some(id) = target.platform_id() else {
            return Err(HandlerError::Failed(FleetError::Validation(
                "patrol requires a single platform target".to_string(),
            )));
        };
        let Some(platform) = core.fleet.get_platform(id) else {
            return Err(HandlerError::Failed(FleetError::UnknownPlatform(id.to_string())));
        };
        if waypoints.is_empty() {
            return Err(HandlerError::Failed(FleetError::Validation(
                "Patrol requires waypoints".to_string(),
            )));
        }

        let start = platform.position;
        let mut route = Vec::with_capacity(waypoints.len());
        let mut current = start;
        for wp in waypoints {
            let next = Position::new(wp.x, wp.y, wp.z.unwrap_or(start.z));
            if let Some((_, message)) = core.constraints.check_path_intersection(&current, &next) {
                return Err(HandlerError::Failed(FleetError::Execution(message)));
            }
            route.push(next);
            current = next;
        }

        core.backend.command_go_to(id, route);
        core.sync_platform(id);
        info!(platform = %id, waypoints = waypoints.len(), loop_route, "patrol commanded");
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;
    use vanguard_constraints::{ConstraintsConfig, ConstraintsEngine, NoGoZone};
    use vanguard_motion::{InstantMotion, TickConfig};
    use vanguard_types::{
        Command, CommandKind, CommandTarget, FormationShape, Platform, PlatformClass,
        PlatformStatus, Position, Task, TaskStatus, Waypoint,
    };

    use crate::orchestrator::{Orchestrator, OrchestratorConfig};

    fn demo_engine() -> ConstraintsEngine {
        ConstraintsEngine::new(ConstraintsConfig {
            no_go_zones: vec![NoGoZone::new(
                "R1",
                vec![(-20.0, -20.0), (-20.0, -10.0), (-10.0, -10.0), (-10.0, -20.0)],
            )],
            ..ConstraintsConfig::default()
        })
    }

    async fn started_orch() -> Orchestrator {
        let orch = Orchestrator::new(
            demo_engine(),
            Box::new(InstantMotion::new()),
            OrchestratorConfig {
                tick: TickConfig {
                    tick_s: 0.02,
                    realtime: true,
                },
                ..OrchestratorConfig::default()
            },
        );
        for (id, name, class, pos) in [
            ("ugv1", "UGV Alpha", PlatformClass::Ground, Position::new(0.0, 0.0, 0.0)),
            ("ugv2", "UGV Bravo", PlatformClass::Ground, Position::new(5.0, 0.0, 0.0)),
            ("uav1", "UAV Delta", PlatformClass::Aerial, Position::new(0.0, 0.0, 15.0)),
        ] {
            orch.register_platform(Platform::new(id, name, class, pos)).await;
        }
        orch.start().await;
        orch
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

    fn go_to(target: &str, x: f64, y: f64, speed: Option<f64>) -> Command {
        Command::new(
            CommandKind::GoTo { x, y, z: None, speed },
            CommandTarget::parse(target),
        )
    }

    #[tokio::test]
    async fn go_to_ground_platform_lands_at_ride_height() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ugv1", 20.0, 30.0, Some(3.0))).await;
        assert_eq!(task.status, TaskStatus::Queued);

        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);

        let platform = orch.get_platform("ugv1").await.unwrap();
        assert_eq!(platform.position.x, 20.0);
        assert_eq!(platform.position.y, 30.0);
        assert_eq!(platform.position.z, 0.25);
        orch.stop().await;
    }

    #[tokio::test]
    async fn go_to_inside_zone_is_rejected_naming_the_zone() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ugv1", -15.0, -15.0, None)).await;
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("R1"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn go_to_path_blocked_at_execution_time_fails_the_task() {
        let orch = started_orch().await;
        // The destination itself is legal (outside R1, inside the world
        // box), so validation approves the command; the straight line from
        // ugv1 at the origin clips R1, which only the execution-time path
        // check catches.
        let task = orch.execute_command(go_to("ugv1", -25.0, -15.0, None)).await;
        assert_eq!(task.status, TaskStatus::Queued);

        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("crosses restricted zone 'R1'"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn orbit_on_ground_platform_fails_with_class_error() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Orbit {
                    center_x: 0.0,
                    center_y: 0.0,
                    radius_m: 10.0,
                    altitude_m: 20.0,
                    angular_speed: None,
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(
            done.error
                .as_deref()
                .unwrap()
                .contains("orbit valid only for aerial-class")
        );
        orch.stop().await;
    }

    #[tokio::test]
    async fn orbit_moves_aerial_platform_to_circle_entry() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Orbit {
                    center_x: 10.0,
                    center_y: -5.0,
                    radius_m: 10.0,
                    altitude_m: 20.0,
                    angular_speed: None,
                },
                CommandTarget::parse("uav1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let uav = orch.get_platform("uav1").await.unwrap();
        assert_eq!(uav.position, Position::new(20.0, -5.0, 20.0));
        orch.stop().await;
    }

    #[tokio::test]
    async fn report_status_stores_snapshot_as_task_output() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(CommandKind::ReportStatus, CommandTarget::All))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let output = done.output.expect("report output");
        assert!(output.get("ugv1").is_some());
        assert!(output.get("uav1").is_some());
        assert_eq!(output["ugv1"]["class"], "ground");
        orch.stop().await;
    }

    #[tokio::test]
    async fn formation_line_offsets_followers_behind_leader() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::FormFormation {
                    formation: FormationShape::Line,
                    spacing_m: 3.0,
                    leader: Some("ugv1".to_string()),
                },
                CommandTarget::GroundClass,
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);

        let leader = orch.get_platform("ugv1").await.unwrap();
        let follower = orch.get_platform("ugv2").await.unwrap();
        assert_eq!(follower.position.x, leader.position.x - 3.0);
        assert_eq!(follower.position.y, leader.position.y);
        orch.stop().await;
    }

    #[tokio::test]
    async fn follow_leader_with_unknown_leader_fails() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::FollowLeader {
                    leader: "ghost".to_string(),
                    gap_m: 3.0,
                },
                CommandTarget::GroundClass,
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("ghost"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn follow_leader_spaces_followers_by_gap_multiples() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::FollowLeader {
                    leader: "ugv1".to_string(),
                    gap_m: 3.0,
                },
                CommandTarget::GroundClass,
            ))
            .await;
        wait_terminal(&orch, task.id).await;
        // ugv1 heads east by default (heading 0), so ugv2 sits 3 m behind.
        let leader = orch.get_platform("ugv1").await.unwrap();
        let follower = orch.get_platform("ugv2").await.unwrap();
        assert!((follower.position.x - (leader.position.x - 3.0)).abs() < 1e-9);
        orch.stop().await;
    }

    #[tokio::test]
    async fn spotlight_requires_aerial_platform() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Spotlight {
                    target_x: 5.0,
                    target_y: 5.0,
                    duration_s: 0.05,
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("aerial-class"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn spotlight_dwells_then_returns_platform_to_idle() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Spotlight {
                    target_x: 5.0,
                    target_y: 5.0,
                    duration_s: 0.05,
                },
                CommandTarget::parse("uav1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let uav = orch.get_platform("uav1").await.unwrap();
        assert_eq!(uav.status, PlatformStatus::Idle);
        orch.stop().await;
    }

    #[tokio::test]
    async fn patrol_visits_waypoints_and_ends_at_the_last() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Patrol {
                    waypoints: vec![
                        Waypoint { x: 5.0, y: 5.0, z: None },
                        Waypoint { x: 10.0, y: 0.0, z: None },
                    ],
                    loop_route: false,
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let ugv = orch.get_platform("ugv1").await.unwrap();
        assert_eq!(ugv.position.x, 10.0);
        assert_eq!(ugv.position.y, 0.0);
        orch.stop().await;
    }

    #[tokio::test]
    async fn patrol_with_no_waypoints_fails() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::Patrol {
                    waypoints: vec![],
                    loop_route: false,
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap().contains("waypoints"));
        orch.stop().await;
    }

    #[tokio::test]
    async fn return_home_preserves_altitude() {
        let orch = started_orch().await;
        let go = orch.execute_command(go_to("uav1", 30.0, 30.0, None)).await;
        wait_terminal(&orch, go.id).await;

        let home = orch
            .execute_command(Command::new(CommandKind::ReturnHome, CommandTarget::parse("uav1")))
            .await;
        wait_terminal(&orch, home.id).await;

        let uav = orch.get_platform("uav1").await.unwrap();
        assert_eq!(uav.position.x, 0.0);
        assert_eq!(uav.position.y, 0.0);
        assert_eq!(uav.position.z, 15.0);
        orch.stop().await;
    }

    #[tokio::test]
    async fn hold_position_without_duration_keeps_holding() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::HoldPosition { duration_s: None },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let ugv = orch.get_platform("ugv1").await.unwrap();
        assert_eq!(ugv.status, PlatformStatus::Holding);
        orch.stop().await;
    }

    #[tokio::test]
    async fn hold_position_with_duration_releases_after_dwell() {
        let orch = started_orch().await;
        let task = orch
            .execute_command(Command::new(
                CommandKind::HoldPosition {
                    duration_s: Some(0.05),
                },
                CommandTarget::parse("ugv1"),
            ))
            .await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        let ugv = orch.get_platform("ugv1").await.unwrap();
        assert_eq!(ugv.status, PlatformStatus::Idle);
        orch.stop().await;
    }

    #[tokio::test]
    async fn group_go_to_moves_every_member_of_the_class() {
        let orch = started_orch().await;
        let task = orch.execute_command(go_to("ground-class", 8.0, 8.0, None)).await;
        let done = wait_terminal(&orch, task.id).await;
        assert_eq!(done.status, TaskStatus::Succeeded);
        for id in ["ugv1", "ugv2"] {
            let p = orch.get_platform(id).await.unwrap();
            assert_eq!((p.position.x, p.position.y), (8.0, 8.0));
        }
        // The aerial platform did not move.
        let uav = orch.get_platform("uav1").await.unwrap();
        assert_eq!(uav.position.x, 0.0);
        orch.stop().await;
    }
}
