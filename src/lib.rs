//! PvP Knockback Engine
//!
//! Custom player-vs-player knockback with per-world and per-area overrides,
//! persisted across restarts.
//!
//! ## Architecture
//!
//! ```text
//! KnockbackApplicator  (knockback.rs)  ← damage event → motion + cooldown
//!   └── OverrideRegistry  (registry.rs) ← resolution + persistence
//!         ├── Area           (area.rs)  ← named boxes, first match wins
//!         ├── WorldOverride  (world.rs) ← whole-world settings
//!         └── default KnockbackProfile  (types.rs)
//! ```
//!
//! The game server stays outside: it implements [`WorldManager`],
//! [`Combatant`] and [`DamageEvent`] and calls
//! [`KnockbackApplicator::apply_hit`] from its damage pipeline.
//! [`autosave::Autosaver`] moves periodic saves off that path.

// Core modules are always available.
pub mod area;
pub mod error;
pub mod format;
pub mod knockback;
pub mod registry;
pub mod types;
pub mod world;

// Background writer requires the `server` feature.
#[cfg(feature = "server")]
pub mod autosave;

pub use area::{Area, Corner, PendingArea};
pub use error::{DecodeError, RegistryError, StoreError};
pub use knockback::{
    knockback_motion, Combatant, DamageCause, DamageEvent, HitOutcome, KnockbackApplicator,
    RandomRoll, ResistanceRoll,
};
pub use registry::{OverrideRegistry, ProfileSource, RegistrySnapshot, Resolved};
pub use types::{KnockbackProfile, RegistryConfig, Vec3};
pub use world::{InMemoryWorlds, WorldHandle, WorldManager, WorldOverride};

#[cfg(feature = "server")]
pub use autosave::Autosaver;
