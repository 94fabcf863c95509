//! Persisted override formats.
//!
//! This module owns **every record shape that crosses the disk boundary**.
//! Domain types convert to and from these records; nothing else touches raw
//! JSON or YAML.
//!
//! ## Files
//!
//! | File          | Shape                                  | Direction    |
//! |---------------|----------------------------------------|--------------|
//! | `worlds.json` | `{ <world id>: WorldRecord }`          | read + write |
//! | `areas.json`  | `{ <area name>: AreaRecord }`          | read + write |
//! | `config.yml`  | `worlds: { <world id>: LegacyWorldRecord }`, `areas: { <name>: LegacyAreaRecord }` | read once |
//!
//! ## Rules
//!
//! 1. Profile records use the keys `xz-kb`, `y-kb`, `speed`.
//! 2. Multipliers must be finite and non-negative; `speed` must be an
//!    unsigned integer. Nothing is coerced.
//! 3. Vectors are written as `{x, y, z}` and read from `{x, y, z}` or
//!    `[x, y, z]`. Partial or non-finite vectors are rejected.
//! 4. Legacy records use one knockback value for both axes.

use crate::error::DecodeError;
use crate::types::{KnockbackProfile, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Values assumed for keys a legacy world record leaves out.
pub mod legacy_defaults {
    pub const CUSTOM_KB: bool = true;
    pub const ATTACK_DELAY: u32 = 10;
    pub const KNOCKBACK: f64 = 0.4;
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "xz-kb")]
    pub horizontal: f64,
    #[serde(rename = "y-kb")]
    pub vertical: f64,
    /// Attack cooldown in ticks.
    pub speed: u32,
}

impl From<&KnockbackProfile> for ProfileRecord {
    fn from(profile: &KnockbackProfile) -> Self {
        Self {
            horizontal: profile.horizontal(),
            vertical: profile.vertical(),
            speed: profile.attack_cooldown(),
        }
    }
}

impl TryFrom<ProfileRecord> for KnockbackProfile {
    type Error = DecodeError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let horizontal = checked_multiplier("xz-kb", record.horizontal)?;
        let vertical = checked_multiplier("y-kb", record.vertical)?;
        Ok(KnockbackProfile::new(horizontal, vertical, record.speed))
    }
}

pub fn encode_profile(profile: &KnockbackProfile) -> Result<Value, serde_json::Error> {
    serde_json::to_value(ProfileRecord::from(profile))
}

pub fn decode_profile(value: &Value) -> Result<KnockbackProfile, DecodeError> {
    let record =
        ProfileRecord::deserialize(value).map_err(DecodeError::malformed("knockback profile"))?;
    KnockbackProfile::try_from(record)
}

/// Multiplier shared by both axes in legacy records.
pub(crate) fn legacy_profile(
    knockback: f64,
    attack_delay: u32,
) -> Result<KnockbackProfile, DecodeError> {
    let kb = checked_multiplier("knockback", knockback)?;
    Ok(KnockbackProfile::new(kb, kb, attack_delay))
}

fn checked_multiplier(field: &'static str, value: f64) -> Result<f64, DecodeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DecodeError::InvalidNumber { field, value })
    }
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum VectorRecord {
    Map { x: f64, y: f64, z: f64 },
    Seq([f64; 3]),
}

pub fn encode_vector(v: &Vec3) -> Result<Value, serde_json::Error> {
    serde_json::to_value(v)
}

pub fn decode_vector(value: &Value, what: &'static str) -> Result<Vec3, DecodeError> {
    let v = match VectorRecord::deserialize(value) {
        Ok(VectorRecord::Map { x, y, z }) => Vec3::new(x, y, z),
        Ok(VectorRecord::Seq([x, y, z])) => Vec3::new(x, y, z),
        Err(_) => return Err(DecodeError::InvalidCorner(what)),
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DecodeError::InvalidCorner(what))
    }
}

// ---------------------------------------------------------------------------
// World records
// ---------------------------------------------------------------------------

/// Current world record: `{kbEnabled, kbInfo}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecord {
    #[serde(rename = "kbEnabled")]
    pub kb_enabled: bool,
    #[serde(rename = "kbInfo")]
    pub kb_info: Value,
}

/// Legacy world record; every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyWorldRecord {
    #[serde(rename = "customKb", default)]
    pub custom_kb: Option<bool>,
    #[serde(rename = "attack-delay", default)]
    pub attack_delay: Option<u32>,
    #[serde(default)]
    pub knockback: Option<f64>,
}

// ---------------------------------------------------------------------------
// Area records
// ---------------------------------------------------------------------------

/// Current area record. All five keys are required; `world` may be `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaRecord {
    pub enabled: bool,
    #[serde(rename = "first-pos")]
    pub first_pos: Value,
    #[serde(rename = "second-pos")]
    pub second_pos: Value,
    pub knockback: Value,
    #[serde(deserialize_with = "Option::deserialize")]
    pub world: Option<String>,
}

/// Legacy area record; one `kb` value drives both axes.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyAreaRecord {
    pub world: String,
    pub kb: f64,
    #[serde(rename = "attack-delay")]
    pub attack_delay: u32,
    pub enabled: bool,
    #[serde(rename = "first-pos")]
    pub first_pos: Value,
    #[serde(rename = "second-pos")]
    pub second_pos: Value,
}
