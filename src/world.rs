//! World subsystem: the `WorldManager` boundary, an in-memory manager, and
//! per-world knockback overrides.

use crate::error::DecodeError;
use crate::format::{self, legacy_defaults, LegacyWorldRecord, WorldRecord};
use crate::knockback::Combatant;
use crate::types::KnockbackProfile;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Handles + manager trait
// ---------------------------------------------------------------------------

/// A live, loaded world.
///
/// `instance` changes every time the world is loaded, so a handle taken
/// before an unload never compares equal to one taken after the reload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldHandle {
    pub instance: u64,
    pub name: String,
}

/// Anything that can load worlds and hand out live handles.
///
/// Overrides never own a `WorldHandle`; they keep the world's name and look
/// the live world up through this trait whenever they need it.
pub trait WorldManager: Send + Sync {
    fn is_world_loaded(&self, name: &str) -> bool;
    /// Load a world by name. Returns `false` if it cannot be loaded.
    fn load_world(&self, name: &str) -> bool;
    fn world_by_name(&self, name: &str) -> Option<WorldHandle>;
    fn loaded_worlds(&self) -> Vec<WorldHandle>;

    /// Load `name` if needed and return its handle.
    fn ensure_loaded(&self, name: &str) -> Option<WorldHandle> {
        if !self.is_world_loaded(name) && !self.load_world(name) {
            return None;
        }
        self.world_by_name(name)
    }
}

// ---------------------------------------------------------------------------
// In-memory manager
// ---------------------------------------------------------------------------

#[derive(Default)]
struct WorldTable {
    /// Worlds that exist on disk and may be loaded.
    available: BTreeSet<String>,
    loaded: BTreeMap<String, WorldHandle>,
    next_instance: u64,
}

/// A `WorldManager` backed by a name table, used by the admin binary and
/// tests.
#[derive(Default)]
pub struct InMemoryWorlds {
    table: RwLock<WorldTable>,
}

impl InMemoryWorlds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manager with every named world available and loaded.
    pub fn with_loaded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let worlds = Self::new();
        for name in names {
            let name = name.into();
            worlds.add_available(name.clone());
            worlds.load_world(&name);
        }
        worlds
    }

    /// Register a world that exists but is not loaded yet.
    pub fn add_available(&self, name: impl Into<String>) {
        self.table.write().available.insert(name.into());
    }

    pub fn unload_world(&self, name: &str) -> bool {
        self.table.write().loaded.remove(name).is_some()
    }
}

impl WorldManager for InMemoryWorlds {
    fn is_world_loaded(&self, name: &str) -> bool {
        self.table.read().loaded.contains_key(name)
    }

    fn load_world(&self, name: &str) -> bool {
        let mut table = self.table.write();
        if table.loaded.contains_key(name) {
            return true;
        }
        if !table.available.contains(name) {
            return false;
        }
        table.next_instance += 1;
        let handle = WorldHandle {
            instance: table.next_instance,
            name: name.to_string(),
        };
        table.loaded.insert(name.to_string(), handle);
        true
    }

    fn world_by_name(&self, name: &str) -> Option<WorldHandle> {
        self.table.read().loaded.get(name).cloned()
    }

    fn loaded_worlds(&self) -> Vec<WorldHandle> {
        self.table.read().loaded.values().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// World override
// ---------------------------------------------------------------------------

/// Knockback settings bound to an entire world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldOverride {
    world_id: String,
    enabled: bool,
    profile: KnockbackProfile,
}

impl WorldOverride {
    pub fn new(world_id: impl Into<String>, enabled: bool, profile: KnockbackProfile) -> Self {
        Self {
            world_id: world_id.into(),
            enabled,
            profile,
        }
    }

    pub fn world_id(&self) -> &str {
        &self.world_id
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

    /// Look the live world up by id. Never cached.
    pub fn resolve_live_world(&self, worlds: &dyn WorldManager) -> Option<WorldHandle> {
        worlds.world_by_name(&self.world_id)
    }

    /// True iff enabled, the world is live, and both combatants stand in it.
    pub fn can_apply(
        &self,
        worlds: &dyn WorldManager,
        a: &dyn Combatant,
        b: &dyn Combatant,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(world) = self.resolve_live_world(worlds) else {
            return false;
        };
        a.world() == world && b.world() == world
    }

    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(WorldRecord {
            kb_enabled: self.enabled,
            kb_info: format::encode_profile(&self.profile)?,
        })
    }

    /// Decode a current-format record. An unreadable `kbInfo` falls back to
    /// `fallback` rather than dropping the whole world.
    pub fn decode(
        world_id: &str,
        data: &Value,
        fallback: &KnockbackProfile,
    ) -> Result<Self, DecodeError> {
        let record =
            WorldRecord::deserialize(data).map_err(DecodeError::malformed("world record"))?;
        let profile = match format::decode_profile(&record.kb_info) {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!(
                    "World '{}' has an unreadable profile ({}); using {}",
                    world_id,
                    e,
                    fallback
                );
                *fallback
            }
        };
        Ok(Self::new(world_id, record.kb_enabled, profile))
    }

    /// Decode a legacy `config.yml` world entry. Missing keys take the
    /// legacy defaults; the single `knockback` value drives both axes.
    pub fn decode_legacy(world_id: &str, data: &Value) -> Result<Self, DecodeError> {
        let record = if data.is_null() {
            LegacyWorldRecord {
                custom_kb: None,
                attack_delay: None,
                knockback: None,
            }
        } else {
            LegacyWorldRecord::deserialize(data)
                .map_err(DecodeError::malformed("legacy world record"))?
        };

        let profile = format::legacy_profile(
            record.knockback.unwrap_or(legacy_defaults::KNOCKBACK),
            record.attack_delay.unwrap_or(legacy_defaults::ATTACK_DELAY),
        )?;
        Ok(Self::new(
            world_id,
            record.custom_kb.unwrap_or(legacy_defaults::CUSTOM_KB),
            profile,
        ))
    }
}
