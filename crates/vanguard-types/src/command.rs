//! The closed command vocabulary.
//!
//! [`CommandKind`] is the strict definition of everything an upstream
//! decision-maker (human console or language-model translator) is allowed to
//! request, in the same spirit as a hardware-intent union: a serde-tagged
//! enum whose JSON Schema can be handed to the translator so its output is
//! structurally constrained. An unrecognised `type` tag fails at
//! deserialisation, which is why the orchestrator's dispatch can match
//! exhaustively with no unknown-command arm.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Waypoint for patrol routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    /// Omitted means "keep current altitude".
    pub z: Option<f64>,
}

/// Formation topologies for `form_formation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormationShape {
    /// Straight line behind the leader.
    Line,
    /// V-shape: alternating left/right rows behind the leader.
    Wedge,
    /// Lateral offset column beside the leader.
    Column,
}

fn default_spacing() -> f64 {
    3.0
}
fn default_gap() -> f64 {
    3.0
}
fn default_radius() -> f64 {
    10.0
}
fn default_altitude() -> f64 {
    20.0
}
fn default_dwell() -> f64 {
    5.0
}

/// The closed set of executable command types.
///
/// Serialised with an internal `type` tag (`{"type": "go_to", "x": 20.0, …}`)
/// so wire payloads stay flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    /// Move to a position. `z` omitted keeps current altitude; `speed`
    /// omitted uses the class maximum.
    GoTo {
        x: f64,
        y: f64,
        z: Option<f64>,
        speed: Option<f64>,
    },
    /// Hold the current position, optionally for a bounded duration.
    HoldPosition { duration_s: Option<f64> },
    /// Immediate stop: zero velocity, mode idle.
    Stop,
    /// Produce a status snapshot for the targeted platforms.
    ReportStatus,
    /// Arrange the targets into a formation around a leader.
    FormFormation {
        formation: FormationShape,
        #[serde(default = "default_spacing")]
        spacing_m: f64,
        /// Explicit leader id; defaults to the first resolved target.
        leader: Option<String>,
    },
    /// Convoy: followers trail the leader along its heading.
    FollowLeader {
        leader: String,
        #[serde(default = "default_gap")]
        gap_m: f64,
    },
    /// Circle a point at a fixed radius and altitude. Aerial only.
    Orbit {
        center_x: f64,
        center_y: f64,
        #[serde(default = "default_radius")]
        radius_m: f64,
        #[serde(default = "default_altitude")]
        altitude_m: f64,
        /// Radians per second; omitted uses the orchestrator default.
        angular_speed: Option<f64>,
    },
    /// Return to the origin at the current altitude.
    ReturnHome,
    /// Illuminate a ground point for a bounded duration. Aerial only.
    Spotlight {
        target_x: f64,
        target_y: f64,
        #[serde(default = "default_dwell")]
        duration_s: f64,
    },
    /// Designate a ground point with the laser for a bounded duration.
    /// Aerial only.
    PointLaser {
        target_x: f64,
        target_y: f64,
        #[serde(default = "default_dwell")]
        duration_s: f64,
    },
    /// Visit a sequence of waypoints.
    Patrol {
        waypoints: Vec<Waypoint>,
        #[serde(default)]
        loop_route: bool,
    },
}

impl CommandKind {
    /// The wire tag of this variant, used for task and event labels.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::GoTo { .. } => "go_to",
            CommandKind::HoldPosition { .. } => "hold_position",
            CommandKind::Stop => "stop",
            CommandKind::ReportStatus => "report_status",
            CommandKind::FormFormation { .. } => "form_formation",
            CommandKind::FollowLeader { .. } => "follow_leader",
            CommandKind::Orbit { .. } => "orbit",
            CommandKind::ReturnHome => "return_home",
            CommandKind::Spotlight { .. } => "spotlight",
            CommandKind::PointLaser { .. } => "point_laser",
            CommandKind::Patrol { .. } => "patrol",
        }
    }
}

/// Command target: a single platform id or a group alias.
///
/// Recognised aliases: `"all"`/`"*"`, `"ground-class"`/`"ground_pod"`,
/// `"aerial-class"`/`"aerial_pod"`. Any other string is treated as a
/// platform id and validated by the constraints engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandTarget {
    Platform(String),
    All,
    GroundClass,
    AerialClass,
}

impl CommandTarget {
    pub fn parse(s: &str) -> Self {
        match s {
            "all" | "*" => CommandTarget::All,
            "ground-class" | "ground_pod" => CommandTarget::GroundClass,
            "aerial-class" | "aerial_pod" => CommandTarget::AerialClass,
            other => CommandTarget::Platform(other.to_string()),
        }
    }

    /// `true` when the target names more than one potential platform.
    pub fn is_group(&self) -> bool {
        !matches!(self, CommandTarget::Platform(_))
    }

    /// The single platform id, when the target is not a group alias.
    pub fn platform_id(&self) -> Option<&str> {
        match self {
            CommandTarget::Platform(id) => Some(id),
            _ => None,
        }
    }
}

impl From<String> for CommandTarget {
    fn from(s: String) -> Self {
        CommandTarget::parse(&s)
    }
}

impl From<CommandTarget> for String {
    fn from(t: CommandTarget) -> Self {
        t.to_string()
    }
}

impl std::fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandTarget::Platform(id) => write!(f, "{id}"),
            CommandTarget::All => write!(f, "all"),
            CommandTarget::GroundClass => write!(f, "ground-class"),
            CommandTarget::AerialClass => write!(f, "aerial-class"),
        }
    }
}

/// A fully-formed command. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub target: CommandTarget,
    #[serde(flatten)]
    pub kind: CommandKind,
    pub issued_at: DateTime<Utc>,
}

impl Command {
    /// Construct a command with a fresh id and the current timestamp.
    pub fn new(kind: CommandKind, target: CommandTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            kind,
            issued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_to_roundtrip_keeps_flat_tag() {
        let cmd = Command::new(
            CommandKind::GoTo {
                x: 20.0,
                y: 30.0,
                z: None,
                speed: Some(3.0),
            },
            CommandTarget::parse("ugv1"),
        );
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"go_to\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, cmd.kind);
        assert_eq!(back.target, CommandTarget::Platform("ugv1".to_string()));
    }

    #[test]
    fn unknown_type_tag_fails_to_deserialize() {
        let json = r#"{"type":"self_destruct","target":"ugv1"}"#;
        let result: Result<CommandKind, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn formation_defaults_apply() {
        let json = r#"{"type":"form_formation","formation":"wedge"}"#;
        let kind: CommandKind = serde_json::from_str(json).unwrap();
        match kind {
            CommandKind::FormFormation {
                formation,
                spacing_m,
                leader,
            } => {
                assert_eq!(formation, FormationShape::Wedge);
                assert_eq!(spacing_m, 3.0);
                assert!(leader.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn orbit_defaults_apply() {
        let json = r#"{"type":"orbit","center_x":10.0,"center_y":-5.0}"#;
        let kind: CommandKind = serde_json::from_str(json).unwrap();
        match kind {
            CommandKind::Orbit {
                radius_m,
                altitude_m,
                angular_speed,
                ..
            } => {
                assert_eq!(radius_m, 10.0);
                assert_eq!(altitude_m, 20.0);
                assert!(angular_speed.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn target_aliases_parse() {
        assert_eq!(CommandTarget::parse("all"), CommandTarget::All);
        assert_eq!(CommandTarget::parse("*"), CommandTarget::All);
        assert_eq!(CommandTarget::parse("ground-class"), CommandTarget::GroundClass);
        assert_eq!(CommandTarget::parse("ground_pod"), CommandTarget::GroundClass);
        assert_eq!(CommandTarget::parse("aerial-class"), CommandTarget::AerialClass);
        assert_eq!(
            CommandTarget::parse("uav1"),
            CommandTarget::Platform("uav1".to_string())
        );
    }

    #[test]
    fn target_serializes_as_plain_string() {
        let json = serde_json::to_string(&CommandTarget::GroundClass).unwrap();
        assert_eq!(json, "\"ground-class\"");
        let back: CommandTarget = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, CommandTarget::All);
    }

    #[test]
    fn kind_names_match_wire_tags() {
        assert_eq!(CommandKind::Stop.name(), "stop");
        assert_eq!(CommandKind::ReportStatus.name(), "report_status");
        assert_eq!(
            CommandKind::Orbit {
                center_x: 0.0,
                center_y: 0.0,
                radius_m: 10.0,
                altitude_m: 20.0,
                angular_speed: None,
            }
            .name(),
            "orbit"
        );
    }

    #[test]
    fn command_schema_includes_every_variant() {
        let schema = schemars::schema_for!(CommandKind);
        let text = serde_json::to_string(&schema).unwrap();
        for tag in [
            "go_to",
            "hold_position",
            "stop",
            "report_status",
            "form_formation",
            "follow_leader",
            "orbit",
            "return_home",
            "spotlight",
            "point_laser",
            "patrol",
        ] {
            assert!(text.contains(tag), "schema missing variant {tag}");
        }
    }
}
