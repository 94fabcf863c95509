//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pvp_knockback::{
    Combatant, DamageCause, DamageEvent, InMemoryWorlds, OverrideRegistry, RegistryConfig, Vec3,
    WorldHandle, WorldManager,
};
use std::sync::Arc;

pub const EPS: f64 = 1e-9;

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

// ---------------------------------------------------------------------------
// Combatants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Fighter {
    pub world: WorldHandle,
    pub position: Vec3,
    pub resistance: f64,
    pub motion: Vec3,
    pub cooldown: u32,
    pub player: bool,
}

impl Fighter {
    pub fn at(world: &WorldHandle, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.clone(),
            position: Vec3::new(x, y, z),
            resistance: 0.0,
            motion: Vec3::zero(),
            cooldown: 0,
            player: true,
        }
    }

    pub fn mob(world: &WorldHandle, x: f64, y: f64, z: f64) -> Self {
        Self {
            player: false,
            ..Self::at(world, x, y, z)
        }
    }
}

impl Combatant for Fighter {
    fn world(&self) -> WorldHandle {
        self.world.clone()
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn knockback_resistance(&self) -> f64 {
        self.resistance
    }

    fn motion(&self) -> Vec3 {
        self.motion
    }

    fn set_motion(&mut self, motion: Vec3) {
        self.motion = motion;
    }

    fn attack_cooldown(&self) -> u32 {
        self.cooldown
    }

    fn set_attack_cooldown(&mut self, ticks: u32) {
        self.cooldown = ticks;
    }

    fn is_player(&self) -> bool {
        self.player
    }
}

// ---------------------------------------------------------------------------
// Damage events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Hit {
    pub cause: DamageCause,
    pub damage: f64,
    pub base: f64,
    pub cooldown: u32,
    pub cancelled: bool,
}

impl Hit {
    pub fn melee() -> Self {
        Self {
            cause: DamageCause::Entity,
            damage: 4.0,
            base: 0.4,
            cooldown: 10,
            cancelled: false,
        }
    }
}

impl DamageEvent for Hit {
    fn final_damage(&self) -> f64 {
        self.damage
    }

    fn knockback_base(&self) -> f64 {
        self.base
    }

    fn attack_cooldown(&self) -> u32 {
        self.cooldown
    }

    fn cause(&self) -> DamageCause {
        self.cause
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

// ---------------------------------------------------------------------------
// Registry helpers
// ---------------------------------------------------------------------------

pub fn worlds(names: &[&str]) -> Arc<InMemoryWorlds> {
    Arc::new(InMemoryWorlds::with_loaded(names.iter().copied()))
}

pub fn handle(worlds: &InMemoryWorlds, name: &str) -> WorldHandle {
    worlds
        .world_by_name(name)
        .unwrap_or_else(|| panic!("world '{}' should be loaded", name))
}

pub fn empty_registry(worlds: Arc<InMemoryWorlds>) -> OverrideRegistry {
    OverrideRegistry::new(RegistryConfig::default(), worlds)
}
