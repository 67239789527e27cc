//! Fleet configuration – reads `vanguard.toml`.
//!
//! Every section has serde defaults, so a missing or partial file yields the
//! demo configuration: a 100 m × 100 m world, the "R1" restricted zone, and
//! a fleet of three ground and two aerial platforms.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use vanguard_constraints::{AvoidPolicy, ConstraintsConfig, NoGoZone, WorldBounds};
use vanguard_motion::{InstantMotion, KinematicMotion, MotionBackend, MotionProfiles, TickConfig};
use vanguard_types::{PlatformClass, Position};

/// Which motion backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// State-teleport semantics; commands settle immediately.
    Instant,
    /// Closed-loop kinematic simulation with smooth motion.
    #[default]
    Kinematic,
}

impl BackendChoice {
    /// Build the chosen backend. Selected exactly once here; nothing
    /// downstream branches on the choice again.
    pub fn build(self) -> Box<dyn MotionBackend> {
        match self {
            BackendChoice::Instant => Box::new(InstantMotion::new()),
            BackendChoice::Kinematic => Box::new(KinematicMotion::new(MotionProfiles::default())),
        }
    }
}

/// One platform roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub id: String,
    pub name: String,
    pub class: PlatformClass,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl PlatformSpec {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }
}

/// Persisted fleet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub backend: BackendChoice,

    #[serde(default)]
    pub avoid_policy: AvoidPolicy,

    #[serde(default)]
    pub tick: TickConfig,

    #[serde(default = "demo_constraints")]
    pub constraints: ConstraintsConfig,

    #[serde(default = "demo_platforms")]
    pub platforms: Vec<PlatformSpec>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::default(),
            avoid_policy: AvoidPolicy::default(),
            tick: TickConfig::default(),
            constraints: demo_constraints(),
            platforms: demo_platforms(),
        }
    }
}

fn demo_constraints() -> ConstraintsConfig {
    ConstraintsConfig {
        world_bounds: WorldBounds {
            x_min: -50.0,
            x_max: 50.0,
            y_min: -50.0,
            y_max: 50.0,
            z_min: 0.0,
            z_max: 30.0,
        },
        no_go_zones: vec![NoGoZone::new(
            "R1",
            vec![(-20.0, -20.0), (-20.0, -10.0), (-10.0, -10.0), (-10.0, -20.0)],
        )],
        ..ConstraintsConfig::default()
    }
}

fn demo_platforms() -> Vec<PlatformSpec> {
    let spec = |id: &str, name: &str, class: PlatformClass, x: f64, y: f64, z: f64| PlatformSpec {
        id: id.to_string(),
        name: name.to_string(),
        class,
        x,
        y,
        z,
    };
    vec![
        spec("ugv1", "UGV Alpha", PlatformClass::Ground, 0.0, 0.0, 0.0),
        spec("ugv2", "UGV Bravo", PlatformClass::Ground, 5.0, 0.0, 0.0),
        spec("ugv3", "UGV Charlie", PlatformClass::Ground, 10.0, 0.0, 0.0),
        spec("uav1", "UAV Delta", PlatformClass::Aerial, 0.0, 0.0, 15.0),
        spec("uav2", "UAV Echo", PlatformClass::Aerial, 5.0, 0.0, 20.0),
    ]
}

/// Default config file location: `$VANGUARD_CONFIG` or `./vanguard.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("VANGUARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("vanguard.toml"))
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<FleetConfig>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &Path) -> Result<Option<FleetConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: FleetConfig =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `VANGUARD_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `VANGUARD_BACKEND` | `backend` (`instant` / `kinematic`) |
/// | `VANGUARD_AVOID_POLICY` | `avoid_policy` (`reject` / `detour`) |
/// | `VANGUARD_TICK_S` | `tick.tick_s` |
pub fn apply_env_overrides(cfg: &mut FleetConfig) {
    if let Ok(v) = std::env::var("VANGUARD_BACKEND") {
        match v.as_str() {
            "instant" => cfg.backend = BackendChoice::Instant,
            "kinematic" => cfg.backend = BackendChoice::Kinematic,
            other => tracing::warn!(value = other, "unrecognised VANGUARD_BACKEND ignored"),
        }
    }
    if let Ok(v) = std::env::var("VANGUARD_AVOID_POLICY") {
        match v.as_str() {
            "reject" => cfg.avoid_policy = AvoidPolicy::Reject,
            "detour" => cfg.avoid_policy = AvoidPolicy::Detour,
            other => tracing::warn!(value = other, "unrecognised VANGUARD_AVOID_POLICY ignored"),
        }
    }
    if let Ok(v) = std::env::var("VANGUARD_TICK_S")
        && let Ok(tick) = v.parse::<f64>()
        && tick > 0.0
    {
        cfg.tick.tick_s = tick;
    }
}
