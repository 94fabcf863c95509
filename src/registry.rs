//! OverrideRegistry – owns world and area overrides, resolves the profile
//! for a pair of combatants, and persists both collections.

use crate::area::{Area, Corner, PendingArea};
use crate::error::{DecodeError, RegistryError, StoreError};
use crate::knockback::Combatant;
use crate::types::{KnockbackProfile, RegistryConfig};
use crate::world::{WorldHandle, WorldManager, WorldOverride};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Resolution result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Area(String),
    World(String),
    Default,
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileSource::Area(name) => write!(f, "area '{}'", name),
            ProfileSource::World(id) => write!(f, "world '{}'", id),
            ProfileSource::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub profile: KnockbackProfile,
    pub source: ProfileSource,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct OverrideRegistry {
    config: RegistryConfig,
    worlds: Arc<dyn WorldManager>,
    world_overrides: BTreeMap<String, WorldOverride>,
    /// Resolution order: first applicable area wins.
    areas: Vec<Area>,
}

impl OverrideRegistry {
    /// An empty registry. Nothing is read from disk.
    pub fn new(config: RegistryConfig, worlds: Arc<dyn WorldManager>) -> Self {
        Self {
            config,
            worlds,
            world_overrides: BTreeMap::new(),
            areas: Vec::new(),
        }
    }

    /// Build a registry from the override files under `config.data_dir`.
    ///
    /// A missing file is created empty and, if enabled, filled once from the
    /// legacy YAML config. Records that fail to decode are skipped.
    pub fn load(
        config: RegistryConfig,
        worlds: Arc<dyn WorldManager>,
    ) -> Result<Self, StoreError> {
        let mut registry = Self::new(config, worlds);
        registry.load_worlds()?;
        registry.load_areas()?;
        info!(
            "Loaded {} world override(s) and {} area(s) from {}",
            registry.world_overrides.len(),
            registry.areas.len(),
            registry.config.data_dir.display()
        );
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn default_profile(&self) -> &KnockbackProfile {
        &self.config.default_profile
    }

    pub fn world_manager(&self) -> &dyn WorldManager {
        self.worlds.as_ref()
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Effective profile for a pair of combatants. Never fails.
    pub fn resolve(&self, a: &dyn Combatant, b: &dyn Combatant) -> KnockbackProfile {
        self.resolve_with_source(a, b).profile
    }

    /// Area overrides (in insertion order) beat the shared world's override,
    /// which beats the default profile.
    pub fn resolve_with_source(&self, a: &dyn Combatant, b: &dyn Combatant) -> Resolved {
        let worlds = self.worlds.as_ref();

        if let Some(area) = self.areas.iter().find(|area| area.can_apply(worlds, a, b)) {
            return Resolved {
                profile: *area.profile(),
                source: ProfileSource::Area(area.name().to_string()),
            };
        }

        let world = a.world();
        if world == b.world() {
            if let Some(wo) = self.lookup_world(&world.name) {
                if wo.can_apply(worlds, a, b) {
                    return Resolved {
                        profile: *wo.profile(),
                        source: ProfileSource::World(wo.world_id().to_string()),
                    };
                }
            }
        }

        Resolved {
            profile: self.config.default_profile,
            source: ProfileSource::Default,
        }
    }

    // -----------------------------------------------------------------------
    // World overrides
    // -----------------------------------------------------------------------

    /// Existing override for `world_id`, without creating one.
    pub fn lookup_world(&self, world_id: &str) -> Option<&WorldOverride> {
        self.world_overrides.get(world_id)
    }

    pub fn lookup_world_mut(&mut self, world_id: &str) -> Option<&mut WorldOverride> {
        self.world_overrides.get_mut(world_id)
    }

    pub fn world_overrides(&self) -> impl Iterator<Item = &WorldOverride> {
        self.world_overrides.values()
    }

    /// Override for a live world, registering an enabled default one first
    /// if the world has none.
    pub fn get_or_create_world(&mut self, world: &WorldHandle) -> &mut WorldOverride {
        let default = self.config.default_profile;
        self.world_overrides
            .entry(world.name.clone())
            .or_insert_with(|| {
                debug!("Creating default knockback override for world '{}'", world.name);
                WorldOverride::new(world.name.clone(), true, default)
            })
    }

    /// Like [`get_or_create_world`](Self::get_or_create_world), loading the
    /// world by name first if needed.
    pub fn get_or_create_world_by_name(
        &mut self,
        name: &str,
    ) -> Result<&mut WorldOverride, RegistryError> {
        let handle = self
            .worlds
            .ensure_loaded(name)
            .ok_or_else(|| RegistryError::WorldUnavailable(name.to_string()))?;
        Ok(self.get_or_create_world(&handle))
    }

    /// Overrides for every loaded world, creating defaults for worlds that
    /// have none yet.
    pub fn list_resolvable_worlds(&mut self) -> Vec<&WorldOverride> {
        let loaded = self.worlds.loaded_worlds();
        for world in &loaded {
            self.get_or_create_world(world);
        }
        loaded
            .iter()
            .filter_map(|w| self.world_overrides.get(&w.name))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Areas
    // -----------------------------------------------------------------------

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.name() == name)
    }

    pub fn area_mut(&mut self, name: &str) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| a.name() == name)
    }

    /// Append an area. Names are unique.
    pub fn add_area(&mut self, area: Area) -> Result<&Area, RegistryError> {
        if self.area(area.name()).is_some() {
            return Err(RegistryError::DuplicateArea(area.name().to_string()));
        }
        info!("Added knockback area '{}'", area.name());
        self.areas.push(area);
        Ok(&self.areas[self.areas.len() - 1])
    }

    /// Commit a player's marked corners as a new enabled area in `world`.
    /// `pending` is cleared only on success.
    pub fn create_area(
        &mut self,
        name: &str,
        pending: &mut PendingArea,
        world: &WorldHandle,
        profile: Option<KnockbackProfile>,
    ) -> Result<&Area, RegistryError> {
        let first = pending
            .first()
            .ok_or(RegistryError::IncompleteArea(Corner::First))?;
        let second = pending
            .second()
            .ok_or(RegistryError::IncompleteArea(Corner::Second))?;
        if self.area(name).is_some() {
            return Err(RegistryError::DuplicateArea(name.to_string()));
        }

        let profile = profile.unwrap_or(self.config.default_profile);
        pending.clear();
        self.add_area(Area::new(
            name,
            Some(world.name.clone()),
            first,
            second,
            profile,
        ))
    }

    pub fn remove_area(&mut self, name: &str) -> Result<Area, RegistryError> {
        let idx = self
            .areas
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| RegistryError::UnknownArea(name.to_string()))?;
        info!("Removed knockback area '{}'", name);
        Ok(self.areas.remove(idx))
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Encoded copy of both collections, detached from the registry.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, StoreError> {
        let worlds = self
            .world_overrides
            .values()
            .map(|w| w.encode().map(|v| (w.world_id().to_string(), v)))
            .collect::<Result<Map<_, _>, serde_json::Error>>()?;
        let areas = self
            .areas
            .iter()
            .map(|a| a.encode().map(|v| (a.name().to_string(), v)))
            .collect::<Result<Map<_, _>, serde_json::Error>>()?;
        Ok(RegistrySnapshot {
            worlds_path: self.config.worlds_path(),
            areas_path: self.config.areas_path(),
            worlds,
            areas,
        })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.snapshot()?.write()
    }

    fn load_worlds(&mut self) -> Result<(), StoreError> {
        let path = self.config.worlds_path();
        if !path.exists() {
            // Written once, after migration: a failed write leaves the file
            // missing so the next load migrates again.
            if self.config.migrate_legacy {
                let mut migrated = 0;
                for (id, data) in self.legacy_section("worlds") {
                    match WorldOverride::decode_legacy(&id, &data) {
                        Ok(wo) => {
                            self.world_overrides.insert(id, wo);
                            migrated += 1;
                        }
                        Err(e) => skip("legacy world", &id, &e),
                    }
                }
                if migrated > 0 {
                    info!("Migrated {} legacy world override(s)", migrated);
                }
            }
            return self.snapshot()?.write_worlds();
        }

        let default = self.config.default_profile;
        for (id, data) in read_json_object(&path)? {
            match WorldOverride::decode(&id, &data, &default) {
                Ok(wo) => {
                    self.world_overrides.insert(id, wo);
                }
                Err(e) => skip("world", &id, &e),
            }
        }
        Ok(())
    }

    fn load_areas(&mut self) -> Result<(), StoreError> {
        let path = self.config.areas_path();
        if !path.exists() {
            if self.config.migrate_legacy {
                let mut migrated = 0;
                for (name, data) in self.legacy_section("areas") {
                    match Area::decode_legacy(&name, &data) {
                        Ok(area) => {
                            self.bind_area_world(&area);
                            self.areas.push(area);
                            migrated += 1;
                        }
                        Err(e) => skip("legacy area", &name, &e),
                    }
                }
                if migrated > 0 {
                    info!("Migrated {} legacy area(s)", migrated);
                }
            }
            return self.snapshot()?.write_areas();
        }

        for (name, data) in read_json_object(&path)? {
            match Area::decode(&name, &data) {
                Ok(area) => {
                    self.bind_area_world(&area);
                    self.areas.push(area);
                }
                Err(e) => skip("area", &name, &e),
            }
        }
        Ok(())
    }

    /// Load the world an area is bound to. Failure leaves the area inert
    /// until the world is loaded some other way.
    fn bind_area_world(&self, area: &Area) {
        if let Some(world) = area.world() {
            if self.worlds.ensure_loaded(world).is_none() {
                warn!(
                    "Area '{}': {}",
                    area.name(),
                    RegistryError::WorldUnavailable(world.to_string())
                );
            }
        }
    }

    /// Entries of one top-level section of the legacy YAML config.
    fn legacy_section(&self, section: &str) -> Vec<(String, Value)> {
        let path = self.config.legacy_config_path();
        if !path.exists() {
            return Vec::new();
        }
        match read_legacy_section(&path, section) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Skipping legacy '{}' migration from {}: {}",
                    section,
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Encoded registry contents plus their target files. Cheap to move to a
/// writer thread; the registry stays usable while it is written.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub worlds_path: PathBuf,
    pub areas_path: PathBuf,
    pub worlds: Map<String, Value>,
    pub areas: Map<String, Value>,
}

impl RegistrySnapshot {
    pub fn write(&self) -> Result<(), StoreError> {
        self.write_worlds()?;
        self.write_areas()
    }

    pub fn write_worlds(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.worlds_path, &self.worlds)
    }

    pub fn write_areas(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.areas_path, &self.areas)
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn skip(kind: &str, key: &str, e: &DecodeError) {
    warn!("Skipping {} '{}': {}", kind, key, e);
}

/// Write to a fresh temp file next to `path`, fsync, then rename it over
/// `path`. Every call gets its own temp file, so concurrent writers of the
/// same target never share partial output.
fn write_json_atomic(path: &Path, contents: &Map<String, Value>) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let data = serde_json::to_vec_pretty(contents)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&data)?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!("Saved {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Top-level object of an override file. Empty or non-object content reads
/// as no entries; unparseable JSON is an error so it is never overwritten.
fn read_json_object(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        other => {
            warn!(
                "{} does not hold an object (found {}); ignoring it",
                path.display(),
                json_kind(&other)
            );
            Ok(Map::new())
        }
    }
}

fn read_legacy_section(path: &Path, section: &str) -> Result<Vec<(String, Value)>, StoreError> {
    let text = fs::read_to_string(path)?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text)?;
    let Some(entries) = doc.get(section).and_then(|s| s.as_mapping()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let key = match key {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => {
                warn!("Skipping legacy {} entry with a non-scalar key", section);
                continue;
            }
        };
        match serde_json::to_value(value) {
            Ok(v) => out.push((key, v)),
            Err(e) => warn!("Skipping legacy {} entry '{}': {}", section, key, e),
        }
    }
    Ok(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
