//! Core knockback types shared across all modules.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Component-wise minimum.
    pub fn min(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum.
    pub fn max(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Built-in knockback values used when nothing else is configured.
pub mod defaults {
    pub const HORIZONTAL_KB: f64 = 0.4;
    pub const VERTICAL_KB: f64 = 0.4;
    /// Vanilla attack cooldown, in ticks.
    pub const ATTACK_COOLDOWN_TICKS: u32 = 10;
    pub const AUTOSAVE_INTERVAL_SECS: u64 = 300;
}

// ---------------------------------------------------------------------------
// Knockback profile
// ---------------------------------------------------------------------------

/// Horizontal/vertical knockback multipliers plus the attack cooldown applied
/// after a successful hit.
///
/// Profiles are values: edits build a new profile and replace the old one.
/// Construction through [`KnockbackProfile::new`] clamps negative or
/// non-finite inputs to zero so the non-negative invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileFields")]
pub struct KnockbackProfile {
    horizontal: f64,
    vertical: f64,
    attack_cooldown: u32,
}

impl KnockbackProfile {
    pub fn new(horizontal: f64, vertical: f64, attack_cooldown: u32) -> Self {
        Self {
            horizontal: sanitize(horizontal),
            vertical: sanitize(vertical),
            attack_cooldown,
        }
    }

    /// Horizontal (x/z) knockback multiplier.
    pub fn horizontal(&self) -> f64 {
        self.horizontal
    }

    /// Vertical (y) knockback multiplier, also the cap on upward motion.
    pub fn vertical(&self) -> f64 {
        self.vertical
    }

    /// Attack cooldown in ticks.
    pub fn attack_cooldown(&self) -> u32 {
        self.attack_cooldown
    }

    pub fn with_horizontal(self, horizontal: f64) -> Self {
        Self::new(horizontal, self.vertical, self.attack_cooldown)
    }

    pub fn with_vertical(self, vertical: f64) -> Self {
        Self::new(self.horizontal, vertical, self.attack_cooldown)
    }

    pub fn with_attack_cooldown(self, attack_cooldown: u32) -> Self {
        Self::new(self.horizontal, self.vertical, attack_cooldown)
    }
}

impl Default for KnockbackProfile {
    fn default() -> Self {
        Self::new(
            defaults::HORIZONTAL_KB,
            defaults::VERTICAL_KB,
            defaults::ATTACK_COOLDOWN_TICKS,
        )
    }
}

impl std::fmt::Display for KnockbackProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "xz={:.3} y={:.3} cooldown={}t",
            self.horizontal, self.vertical, self.attack_cooldown
        )
    }
}

/// Config-side shape of a profile; routed through [`KnockbackProfile::new`].
#[derive(Deserialize)]
struct ProfileFields {
    horizontal: f64,
    vertical: f64,
    attack_cooldown: u32,
}

impl From<ProfileFields> for KnockbackProfile {
    fn from(f: ProfileFields) -> Self {
        Self::new(f.horizontal, f.vertical, f.attack_cooldown)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding the persisted override files.
    pub data_dir: PathBuf,
    /// World overrides file, relative to `data_dir`.
    pub worlds_file: String,
    /// Area overrides file, relative to `data_dir`.
    pub areas_file: String,
    /// Old YAML config consulted once when an override file is missing.
    pub legacy_config_file: String,
    /// Whether to attempt the one-time legacy migration at all.
    pub migrate_legacy: bool,
    /// Profile used when no area or world override applies.
    pub default_profile: KnockbackProfile,
    /// Background autosave period in seconds (server feature).
    pub autosave_interval_secs: u64,
}

impl RegistryConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn worlds_path(&self) -> PathBuf {
        self.data_dir.join(&self.worlds_file)
    }

    pub fn areas_path(&self) -> PathBuf {
        self.data_dir.join(&self.areas_file)
    }

    pub fn legacy_config_path(&self) -> PathBuf {
        self.data_dir.join(&self.legacy_config_file)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            worlds_file: "worlds.json".into(),
            areas_file: "areas.json".into(),
            legacy_config_file: "config.yml".into(),
            migrate_legacy: true,
            default_profile: KnockbackProfile::default(),
            autosave_interval_secs: defaults::AUTOSAVE_INTERVAL_SECS,
        }
    }
}
