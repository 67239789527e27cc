//! [`ConstraintsEngine`] – the single interception point between a command
//! source and the orchestrator.
//!
//! Every command must pass [`ConstraintsEngine::check_command`] before it is
//! scheduled. The engine is a pure function of its inputs: it borrows a
//! fleet snapshot, never mutates it, and holds no state beyond its
//! configuration, so it is safe to call concurrently with scheduling.
//!
//! Unlike a first-failure gate, `check_command` accumulates *every* detected
//! violation so the rejection message enumerates all of them, not just the
//! first.

use tracing::debug;

use vanguard_types::{Command, CommandKind, CommandTarget, FleetState, Platform, Position};

use crate::config::{AvoidPolicy, ConstraintsConfig};

/// Margin added around a zone's bounding box when computing detours.
const DETOUR_MARGIN_M: f64 = 2.0;

// ────────────────────────────────────────────────────────────────────────────
// Verdict and report
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of running a command through the constraints engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintVerdict {
    Approved,
    Rejected,
    /// The command was modified into a safe variant.
    Rewritten,
}

/// The full result of a constraint check.
#[derive(Debug, Clone)]
pub struct ConstraintReport {
    pub verdict: ConstraintVerdict,
    /// Set when the verdict is `Approved` (the original command) or
    /// `Rewritten` (the clamped variant).
    pub approved_command: Option<Command>,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ConstraintReport {
    /// `true` for `Approved` and `Rewritten` verdicts.
    pub fn is_approved(&self) -> bool {
        matches!(
            self.verdict,
            ConstraintVerdict::Approved | ConstraintVerdict::Rewritten
        )
    }

    /// Human-readable rejection message enumerating every violation.
    pub fn rejection_message(&self) -> String {
        if self.violations.is_empty() {
            "Command approved.".to_string()
        } else {
            format!("Command rejected: {}", self.violations.join("; "))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Safety constraints engine. Validates commands against fleet state and
/// safety rules, before any command is executed.
#[derive(Debug, Clone, Default)]
pub struct ConstraintsEngine {
    config: ConstraintsConfig,
}

impl ConstraintsEngine {
    pub fn new(config: ConstraintsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConstraintsConfig {
        &self.config
    }

    /// Validate `command` against all safety constraints.
    ///
    /// A single-platform target that is not registered rejects immediately.
    /// Group targets skip the per-platform checks here; the orchestrator
    /// validates each resolved member at dispatch time.
    pub fn check_command(&self, command: &Command, fleet: &FleetState) -> ConstraintReport {
        let mut violations: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut suggestions: Vec<String> = Vec::new();

        let platform = match &command.target {
            CommandTarget::Platform(id) => match fleet.get_platform(id) {
                Some(p) => Some(p),
                None => {
                    violations.push(format!("Unknown platform: '{id}'"));
                    return ConstraintReport {
                        verdict: ConstraintVerdict::Rejected,
                        approved_command: None,
                        violations,
                        warnings,
                        suggestions,
                    };
                }
            },
            _ => None,
        };

        if let Some(platform) = platform {
            if let Some(v) = self.check_comms_timeout(platform) {
                violations.push(v);
            }
            if let Some(v) = self.check_speed_limit(command, platform) {
                let limit = self.config.speed_limits.limit_for(platform.class);
                violations.push(v);
                suggestions.push(format!("Use speed <= {limit} m/s for {}", platform.class));
            }
        }

        if let Some(v) = self.check_world_bounds(command) {
            violations.push(v);
        }
        violations.extend(self.check_no_go_zones(command));

        if let Some(platform) = platform
            && let Some(w) = self.check_separation(command, platform, fleet)
        {
            // Separation is a warning, not a hard rejection (could be
            // transient).
            warnings.push(w);
            suggestions.push(format!(
                "Ensure minimum {}m separation",
                self.config.min_separation_m
            ));
        }

        if !violations.is_empty() {
            debug!(
                command = command.kind.name(),
                target = %command.target,
                violations = violations.len(),
                "command rejected"
            );
            return ConstraintReport {
                verdict: ConstraintVerdict::Rejected,
                approved_command: None,
                violations,
                warnings,
                suggestions,
            };
        }

        ConstraintReport {
            verdict: ConstraintVerdict::Approved,
            approved_command: Some(command.clone()),
            violations,
            warnings,
            suggestions,
        }
    }

    /// Like [`check_command`][Self::check_command], but when the command is
    /// rejected and rewriting is enabled, attempt to clamp it into a safe
    /// variant. Returns a `Rewritten` report carrying the clamped command
    /// when the variant passes a full re-check; the original violations are
    /// kept on the report to explain why the rewrite happened.
    pub fn check_with_rewrite(&self, command: &Command, fleet: &FleetState) -> ConstraintReport {
        let report = self.check_command(command, fleet);
        if report.is_approved() || !self.config.allow_rewrite {
            return report;
        }

        let Some(platform) = command
            .target
            .platform_id()
            .and_then(|id| fleet.get_platform(id))
        else {
            return report;
        };

        let Some(rewritten) = self.try_rewrite_safe(command, platform) else {
            return report;
        };

        let recheck = self.check_command(&rewritten, fleet);
        if !recheck.is_approved() {
            return report;
        }

        ConstraintReport {
            verdict: ConstraintVerdict::Rewritten,
            approved_command: Some(rewritten),
            violations: report.violations,
            warnings: recheck.warnings,
            suggestions: report.suggestions,
        }
    }

    /// Check whether a position is safe to occupy: inside the world bounds,
    /// outside every no-go zone, and (when a fleet snapshot is supplied)
    /// clear of every other platform by the minimum separation distance.
    pub fn check_position_safe(
        &self,
        position: &Position,
        exclude_platform_id: Option<&str>,
        fleet: Option<&FleetState>,
    ) -> (bool, Vec<String>) {
        let mut violations = Vec::new();

        if !self.config.world_bounds.contains(position) {
            violations.push(format!(
                "Position ({:.1}, {:.1}, {:.1}) is outside world bounds",
                position.x, position.y, position.z
            ));
        }

        for zone in &self.config.no_go_zones {
            if zone.contains_position(position) {
                violations.push(format!(
                    "Position ({:.1}, {:.1}) is inside no-go zone '{}'",
                    position.x, position.y, zone.name
                ));
            }
        }

        if let Some(fleet) = fleet {
            for (pid, other) in &fleet.platforms {
                if Some(pid.as_str()) == exclude_platform_id {
                    continue;
                }
                let dist = position.distance_to(&other.position);
                if dist < self.config.min_separation_m {
                    violations.push(format!(
                        "Position is {dist:.1}m from platform '{pid}' (minimum: {}m)",
                        self.config.min_separation_m
                    ));
                }
            }
        }

        (violations.is_empty(), violations)
    }

    /// Does the straight segment `start → end` cross any no-go zone?
    ///
    /// Returns the name of the first intersecting zone and a descriptive
    /// message, or `None` when the path is clear.
    pub fn check_path_intersection(
        &self,
        start: &Position,
        end: &Position,
    ) -> Option<(String, String)> {
        for zone in &self.config.no_go_zones {
            if zone.path_intersects(start, end) {
                let msg = format!(
                    "Path from ({:.1}, {:.1}) to ({:.1}, {:.1}) crosses restricted zone '{}'",
                    start.x, start.y, end.x, end.y, zone.name
                );
                return Some((zone.name.clone(), msg));
            }
        }
        None
    }

    /// Compute a safe waypoint list from `start` to `end`.
    ///
    /// A destination inside a zone always rejects, under either policy. A
    /// clear direct segment returns `[end]`. A blocked segment returns no
    /// path plus a message (and a suggested waypoint) under
    /// [`AvoidPolicy::Reject`]; under [`AvoidPolicy::Detour`] the heuristic
    /// waypoints are inserted and every resulting leg is re-verified
    /// independently, falling back to rejection when any leg still
    /// intersects a zone.
    pub fn get_safe_path(
        &self,
        start: &Position,
        end: &Position,
        policy: AvoidPolicy,
    ) -> (Vec<Position>, Option<String>) {
        for zone in &self.config.no_go_zones {
            if zone.contains_position(end) {
                return (
                    Vec::new(),
                    Some(format!(
                        "Target ({:.1}, {:.1}) is inside zone '{}'",
                        end.x, end.y, zone.name
                    )),
                );
            }
        }

        let Some((zone_name, msg)) = self.check_path_intersection(start, end) else {
            return (vec![*end], None);
        };

        let zone = self
            .config
            .no_go_zones
            .iter()
            .find(|z| z.name == zone_name);

        match policy {
            AvoidPolicy::Reject => {
                if let Some(zone) = zone {
                    let detour = zone.detour_waypoints(start, end, DETOUR_MARGIN_M);
                    if let Some(first) = detour.first() {
                        return (
                            Vec::new(),
                            Some(format!(
                                "{msg}. Suggested waypoint: ({:.1}, {:.1})",
                                first.x, first.y
                            )),
                        );
                    }
                }
                (Vec::new(), Some(msg))
            }
            AvoidPolicy::Detour => {
                let Some(zone) = zone else {
                    return (Vec::new(), Some(msg));
                };
                let detour = zone.detour_waypoints(start, end, DETOUR_MARGIN_M);

                // Every leg must be independently clear of every zone, not
                // just the one that blocked the direct segment.
                let mut waypoints = Vec::with_capacity(detour.len() + 1);
                let mut current = *start;
                for wp in detour {
                    if self.check_path_intersection(&current, &wp).is_some() {
                        return (
                            Vec::new(),
                            Some(format!("{msg}. Unable to compute safe detour.")),
                        );
                    }
                    waypoints.push(wp);
                    current = wp;
                }
                if self.check_path_intersection(&current, end).is_some() {
                    return (
                        Vec::new(),
                        Some(format!("{msg}. Unable to compute safe detour.")),
                    );
                }
                waypoints.push(*end);
                (waypoints, None)
            }
        }
    }

    /// Attempt to rewrite `command` into a safe variant by clamping an
    /// over-limit speed to the class limit and an out-of-bounds destination
    /// componentwise into the world box.
    ///
    /// Returns `Some` only when rewriting is enabled and at least one field
    /// actually changed, which makes the operation idempotent: applying it
    /// to an already-safe command yields `None`.
    pub fn try_rewrite_safe(&self, command: &Command, platform: &Platform) -> Option<Command> {
        if !self.config.allow_rewrite {
            return None;
        }

        let CommandKind::GoTo { x, y, z, speed } = &command.kind else {
            return None;
        };

        let mut modified = false;

        let mut new_speed = *speed;
        if let Some(s) = speed {
            let limit = self.config.speed_limits.limit_for(platform.class);
            if *s > limit {
                new_speed = Some(limit);
                modified = true;
            }
        }

        let assumed_z = z.unwrap_or(0.0);
        let pos = Position::new(*x, *y, assumed_z);
        let clamped = self.config.world_bounds.clamp(&pos);
        let (mut new_x, mut new_y, mut new_z) = (*x, *y, *z);
        if clamped != pos {
            new_x = clamped.x;
            new_y = clamped.y;
            new_z = if z.is_some() || clamped.z != assumed_z {
                Some(clamped.z)
            } else {
                None
            };
            modified = true;
        }

        if !modified {
            return None;
        }

        Some(Command {
            id: command.id,
            target: command.target.clone(),
            kind: CommandKind::GoTo {
                x: new_x,
                y: new_y,
                z: new_z,
                speed: new_speed,
            },
            issued_at: command.issued_at,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Individual constraint checks
    // ────────────────────────────────────────────────────────────────────────

    fn check_comms_timeout(&self, platform: &Platform) -> Option<String> {
        let seconds = platform.seconds_since_heartbeat();
        if seconds > self.config.comms_timeout_s {
            return Some(format!(
                "Platform '{}' has not responded for {seconds:.1}s (timeout: {}s). \
                 Commands blocked until comms restored.",
                platform.id, self.config.comms_timeout_s
            ));
        }
        None
    }

    fn check_speed_limit(&self, command: &Command, platform: &Platform) -> Option<String> {
        let CommandKind::GoTo {
            speed: Some(requested),
            ..
        } = &command.kind
        else {
            return None;
        };

        let limit = self.config.speed_limits.limit_for(platform.class);
        if *requested > limit {
            return Some(format!(
                "Requested speed {requested} m/s exceeds maximum {limit} m/s for {}",
                platform.class.to_string().to_uppercase()
            ));
        }
        None
    }

    fn check_world_bounds(&self, command: &Command) -> Option<String> {
        let bounds = &self.config.world_bounds;

        let mut check = |x: f64, y: f64, z: f64| -> Option<String> {
            if bounds.contains(&Position::new(x, y, z)) {
                return None;
            }
            // Report each violating axis separately.
            let mut parts = Vec::new();
            if !(bounds.x_min <= x && x <= bounds.x_max) {
                parts.push(format!("x={x:.1} outside [{}, {}]", bounds.x_min, bounds.x_max));
            }
            if !(bounds.y_min <= y && y <= bounds.y_max) {
                parts.push(format!("y={y:.1} outside [{}, {}]", bounds.y_min, bounds.y_max));
            }
            if !(bounds.z_min <= z && z <= bounds.z_max) {
                parts.push(format!("z={z:.1} outside [{}, {}]", bounds.z_min, bounds.z_max));
            }
            Some(format!("Target position out of bounds: {}", parts.join(", ")))
        };

        match &command.kind {
            CommandKind::GoTo { x, y, z, .. } => check(*x, *y, z.unwrap_or(0.0)),
            CommandKind::Patrol { waypoints, .. } => waypoints
                .iter()
                .find_map(|wp| check(wp.x, wp.y, wp.z.unwrap_or(0.0))),
            _ => None,
        }
    }

    fn check_no_go_zones(&self, command: &Command) -> Vec<String> {
        let mut destinations: Vec<(f64, f64)> = Vec::new();
        match &command.kind {
            CommandKind::GoTo { x, y, .. } => destinations.push((*x, *y)),
            CommandKind::Patrol { waypoints, .. } => {
                destinations.extend(waypoints.iter().map(|wp| (wp.x, wp.y)));
            }
            _ => return Vec::new(),
        }

        let mut violations = Vec::new();
        for (x, y) in destinations {
            for zone in &self.config.no_go_zones {
                if zone.contains_point(x, y) {
                    violations.push(format!(
                        "Target position ({x:.1}, {y:.1}) is inside restricted zone '{}'",
                        zone.name
                    ));
                }
            }
        }
        violations
    }

    fn check_separation(
        &self,
        command: &Command,
        platform: &Platform,
        fleet: &FleetState,
    ) -> Option<String> {
        let CommandKind::GoTo { x, y, z, .. } = &command.kind else {
            return None;
        };

        // Full 3-D distance; zone checks stay planar because zones model
        // all-altitude hazards while separation models physical proximity.
        let target = Position::new(*x, *y, z.unwrap_or(platform.position.z));

        for (pid, other) in &fleet.platforms {
            if pid == &platform.id {
                continue;
            }
            let dist = target.distance_to(&other.position);
            if dist < self.config.min_separation_m {
                return Some(format!(
                    "Target position would be {dist:.1}m from platform '{pid}' \
                     (minimum separation: {}m)",
                    self.config.min_separation_m
                ));
            }
        }
        None
    }
}
