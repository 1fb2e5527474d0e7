//! Configuration snapshot.
//!
//! The whole tree is a plain value: it is loaded once, validated, and then
//! handed to the controller as an `Arc<PostureConfig>`. Reloads build a new
//! value instead of mutating the old one.
//!
//! On disk it is JSON with camelCase keys:
//!
//! ```text
//! {
//!   "core":        { "enabled", "cooldownS", "cancelOnDamage", "cancelOnMove",
//!                    "allowInWater", "disableInWorlds", "cancelOnDanger" },
//!   "postures":    { "crawl": { "enabled", "waterOnly" },
//!                    "sit" | "chair" | "lay" | "belly":
//!                        { "enabled", "offsetX", "offsetY", "offsetZ", "pitchDegrees" } },
//!   "permissions": { "crawl", "sit", "chair", "lay", "belly", "admin",
//!                    "fallbackOpLevels": { ... } }
//! }
//! ```
//!
//! Any key may be omitted; missing keys keep their default value, including
//! keys inside a partially written section.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Vec3;
use super::kind::PostureKind;

/// Longest cooldown accepted without a validation warning.
pub const MAX_COOLDOWN_SECS: f64 = 60.0;

/// Seat offsets are expected within this many blocks on each axis.
pub const MAX_SEAT_OFFSET: f64 = 4.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostureConfig {
    pub core: CoreConfig,
    pub postures: PosturesConfig,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Master switch for every posture
    pub enabled: bool,

    /// Minimum seconds between two posture starts
    pub cooldown_s: f64,

    pub cancel_on_damage: KindFlags,

    pub cancel_on_move: KindFlags,

    pub allow_in_water: KindFlags,

    /// World identifiers where postures are unavailable
    pub disable_in_worlds: BTreeSet<String>,

    /// Stop crawling when the space above the actor becomes obstructed
    pub cancel_on_danger: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_s: 2.0,
            cancel_on_damage: KindFlags {
                crawl: false,
                sit: true,
                chair: true,
                lay: true,
                belly: true,
            },
            cancel_on_move: KindFlags {
                crawl: false,
                sit: true,
                chair: true,
                lay: false,
                belly: false,
            },
            allow_in_water: KindFlags::default(),
            disable_in_worlds: BTreeSet::new(),
            cancel_on_danger: true,
        }
    }
}

/// One boolean per posture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KindFlags {
    pub crawl: bool,
    pub sit: bool,
    pub chair: bool,
    pub lay: bool,
    pub belly: bool,
}

impl KindFlags {
    pub fn get(&self, kind: PostureKind) -> bool {
        match kind {
            PostureKind::Crawl => self.crawl,
            PostureKind::Sit => self.sit,
            PostureKind::Chair => self.chair,
            PostureKind::Lay => self.lay,
            PostureKind::Belly => self.belly,
            PostureKind::Admin => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosturesConfig {
    pub crawl: CrawlConfig,
    pub sit: SeatConfig,
    pub chair: SeatConfig,
    pub lay: SeatConfig,
    pub belly: SeatConfig,
}

impl Default for PosturesConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            sit: SeatConfig::new(Vec3::new(0.0, -0.45, 0.0), 0.0),
            chair: SeatConfig::new(Vec3::ZERO, 0.0),
            lay: SeatConfig::new(Vec3::new(0.0, -0.90, 0.0), 90.0),
            belly: SeatConfig::new(Vec3::new(0.0, -0.92, 0.0), -90.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlConfig {
    pub enabled: bool,

    /// Crawling is only allowed while touching water
    pub water_only: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            water_only: false,
        }
    }
}

/// Geometry and enablement of one seated posture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeatConfig {
    pub enabled: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_z: f64,

    /// Pitch the actor is eased towards while seated
    pub pitch_degrees: f32,
}

impl SeatConfig {
    pub fn new(offset: Vec3, pitch_degrees: f32) -> Self {
        Self {
            enabled: true,
            offset_x: offset.x,
            offset_y: offset.y,
            offset_z: offset.z,
            pitch_degrees,
        }
    }

    pub fn offset(&self) -> Vec3 {
        Vec3::new(self.offset_x, self.offset_y, self.offset_z)
    }
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionsConfig {
    pub crawl: String,
    pub sit: String,
    pub chair: String,
    pub lay: String,
    pub belly: String,
    pub admin: String,
    pub fallback_op_levels: FallbackLevels,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            crawl: "posture.crawl".to_string(),
            sit: "posture.sit".to_string(),
            chair: "posture.chair".to_string(),
            lay: "posture.lay".to_string(),
            belly: "posture.belly".to_string(),
            admin: "posture.admin".to_string(),
            fallback_op_levels: FallbackLevels::default(),
        }
    }
}

/// Operator level required when no permission backend has an opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackLevels {
    pub crawl: u8,
    pub sit: u8,
    pub chair: u8,
    pub lay: u8,
    pub belly: u8,
    pub admin: u8,
}

impl Default for FallbackLevels {
    fn default() -> Self {
        Self {
            crawl: 0,
            sit: 0,
            chair: 0,
            lay: 0,
            belly: 0,
            admin: 2,
        }
    }
}

impl PostureConfig {
    /// Parse a JSON document, filling every missing key from the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let overlay: serde_json::Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(Self::default())?;
        merge_json(&mut merged, overlay);
        let config: Self = serde_json::from_value(merged)?;
        for problem in config.validation_errors() {
            tracing::warn!(%problem, "posture config validation");
        }
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Load `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let defaults = Self::default();
        defaults.save(path)?;
        tracing::info!(path = %path.display(), "wrote default posture config");
        Ok(defaults)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(path, self.to_json_string()?).map_err(write_err)
    }

    /// Human-readable problems with the current values. Empty when valid.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let cooldown = self.core.cooldown_s;
        if cooldown.is_nan() || !(0.0..=MAX_COOLDOWN_SECS).contains(&cooldown) {
            errors.push(format!(
                "core.cooldownS must be between 0 and {} seconds",
                MAX_COOLDOWN_SECS
            ));
        }

        for kind in PostureKind::SEATED {
            let Some(seat) = self.seat(kind) else {
                continue;
            };
            for (axis, value) in [
                ("offsetX", seat.offset_x),
                ("offsetY", seat.offset_y),
                ("offsetZ", seat.offset_z),
            ] {
                if value.is_nan() || !(-MAX_SEAT_OFFSET..=MAX_SEAT_OFFSET).contains(&value) {
                    errors.push(format!(
                        "postures.{}.{} must be between -{} and {}",
                        kind, axis, MAX_SEAT_OFFSET, MAX_SEAT_OFFSET
                    ));
                }
            }
            let pitch = seat.pitch_degrees;
            if pitch.is_nan() || !(-90.0..=90.0).contains(&pitch) {
                errors.push(format!("postures.{}.pitchDegrees must be within [-90, 90]", kind));
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    pub fn cooldown(&self) -> Duration {
        let secs = self.core.cooldown_s;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    pub fn is_world_disabled(&self, world: &str) -> bool {
        self.core.disable_in_worlds.contains(world)
    }

    /// Seat geometry for a seated kind.
    pub fn seat(&self, kind: PostureKind) -> Option<&SeatConfig> {
        match kind {
            PostureKind::Sit => Some(&self.postures.sit),
            PostureKind::Chair => Some(&self.postures.chair),
            PostureKind::Lay => Some(&self.postures.lay),
            PostureKind::Belly => Some(&self.postures.belly),
            PostureKind::Crawl | PostureKind::Admin => None,
        }
    }

    /// Per-kind enablement, ignoring the master switch.
    pub fn kind_enabled(&self, kind: PostureKind) -> bool {
        match kind {
            PostureKind::Crawl => self.postures.crawl.enabled,
            PostureKind::Admin => true,
            seated => self.seat(seated).map(|s| s.enabled).unwrap_or(false),
        }
    }

    pub fn permission_node(&self, kind: PostureKind) -> &str {
        let perms = &self.permissions;
        match kind {
            PostureKind::Crawl => &perms.crawl,
            PostureKind::Sit => &perms.sit,
            PostureKind::Chair => &perms.chair,
            PostureKind::Lay => &perms.lay,
            PostureKind::Belly => &perms.belly,
            PostureKind::Admin => &perms.admin,
        }
    }

    pub fn fallback_level(&self, kind: PostureKind) -> u8 {
        let levels = &self.permissions.fallback_op_levels;
        match kind {
            PostureKind::Crawl => levels.crawl,
            PostureKind::Sit => levels.sit,
            PostureKind::Chair => levels.chair,
            PostureKind::Lay => levels.lay,
            PostureKind::Belly => levels.belly,
            PostureKind::Admin => levels.admin,
        }
    }

    pub fn cancel_on_damage(&self, kind: PostureKind) -> bool {
        self.core.cancel_on_damage.get(kind)
    }

    pub fn cancel_on_move(&self, kind: PostureKind) -> bool {
        self.core.cancel_on_move.get(kind)
    }

    pub fn allow_in_water(&self, kind: PostureKind) -> bool {
        self.core.allow_in_water.get(kind)
    }
}

/// Recursively overlay `overlay` onto `base`. Objects merge key by key;
/// everything else replaces.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
