//! Area subsystem: named axis-aligned boxes carrying their own knockback
//! profile, plus the two-corner marking state used to create them.

use crate::error::DecodeError;
use crate::format::{self, AreaRecord, LegacyAreaRecord};
use crate::knockback::Combatant;
use crate::types::{KnockbackProfile, Vec3};
use crate::world::WorldManager;
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Corners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    First,
    Second,
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Corner::First => f.write_str("first"),
            Corner::Second => f.write_str("second"),
        }
    }
}

/// Corners marked so far by one player while creating an area.
///
/// Lives on the player's session, not in the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingArea {
    first: Option<Vec3>,
    second: Option<Vec3>,
}

impl PendingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, corner: Corner, pos: Vec3) {
        match corner {
            Corner::First => self.first = Some(pos),
            Corner::Second => self.second = Some(pos),
        }
    }

    pub fn first(&self) -> Option<Vec3> {
        self.first
    }

    pub fn second(&self) -> Option<Vec3> {
        self.second
    }

    pub fn is_complete(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }

    pub fn clear(&mut self) {
        self.first = None;
        self.second = None;
    }
}

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// A named box in one world with its own knockback profile.
///
/// Corners are stored as marked; they are ordered per axis only when
/// testing containment. Equality compares every field; use
/// [`Area::same_name_and_state`] for the looser name + enabled comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    name: String,
    world: Option<String>,
    first: Vec3,
    second: Vec3,
    enabled: bool,
    profile: KnockbackProfile,
}

impl Area {
    pub fn new(
        name: impl Into<String>,
        world: Option<String>,
        first: Vec3,
        second: Vec3,
        profile: KnockbackProfile,
    ) -> Self {
        Self {
            name: name.into(),
            world,
            first,
            second,
            enabled: true,
            profile,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the world this area is bound to, if any.
    pub fn world(&self) -> Option<&str> {
        self.world.as_deref()
    }

    pub fn corner(&self, corner: Corner) -> Vec3 {
        match corner {
            Corner::First => self.first,
            Corner::Second => self.second,
        }
    }

    pub fn set_corner(&mut self, corner: Corner, pos: Vec3) {
        match corner {
            Corner::First => self.first = pos,
            Corner::Second => self.second = pos,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn profile(&self) -> &KnockbackProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: KnockbackProfile) {
        self.profile = profile;
    }

    /// Inclusive containment on all three axes.
    pub fn contains(&self, pos: &Vec3) -> bool {
        let min = self.first.min(self.second);
        let max = self.first.max(self.second);
        (min.x..=max.x).contains(&pos.x)
            && (min.y..=max.y).contains(&pos.y)
            && (min.z..=max.z).contains(&pos.z)
    }

    /// True iff enabled, bound to a live world, both combatants are in that
    /// world and both stand inside the box.
    pub fn can_apply(
        &self,
        worlds: &dyn WorldManager,
        a: &dyn Combatant,
        b: &dyn Combatant,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(world) = self.world.as_deref().and_then(|w| worlds.world_by_name(w)) else {
            return false;
        };
        let world_a = a.world();
        if world_a != b.world() || world_a != world {
            return false;
        }
        self.contains(&a.position()) && self.contains(&b.position())
    }

    pub fn same_name_and_state(&self, other: &Area) -> bool {
        self.name == other.name && self.enabled == other.enabled
    }

    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(AreaRecord {
            enabled: self.enabled,
            first_pos: format::encode_vector(&self.first)?,
            second_pos: format::encode_vector(&self.second)?,
            knockback: format::encode_profile(&self.profile)?,
            world: self.world.clone(),
        })
    }

    /// Decode a current-format record. Pure: loading the bound world is the
    /// registry's job.
    pub fn decode(name: &str, data: &Value) -> Result<Self, DecodeError> {
        let record =
            AreaRecord::deserialize(data).map_err(DecodeError::malformed("area record"))?;
        let first = format::decode_vector(&record.first_pos, "first-pos")?;
        let second = format::decode_vector(&record.second_pos, "second-pos")?;
        let profile = format::decode_profile(&record.knockback)?;
        Ok(Self::new(name, record.world, first, second, profile).with_enabled(record.enabled))
    }

    pub fn decode_legacy(name: &str, data: &Value) -> Result<Self, DecodeError> {
        let record = LegacyAreaRecord::deserialize(data)
            .map_err(DecodeError::malformed("legacy area record"))?;
        let first = format::decode_vector(&record.first_pos, "first-pos")?;
        let second = format::decode_vector(&record.second_pos, "second-pos")?;
        let profile = format::legacy_profile(record.kb, record.attack_delay)?;
        Ok(
            Self::new(name, Some(record.world), first, second, profile)
                .with_enabled(record.enabled),
        )
    }
}
