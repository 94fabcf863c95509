//! Knockback application: turns a damage event into a velocity change and an
//! attack cooldown on the defender.
//!
//! ## Per-hit flow
//!
//! ```text
//! DamageEvent ──► cancelled? ──yes──► HitOutcome::Cancelled
//!                    │ no
//!                    ▼
//!     attacker is a player? ──► OverrideRegistry::resolve_with_source
//!                    │                (area > world > default)
//!                    ▼
//!     direction (melee: defender − attacker, projectile: its motion)
//!                    ▼
//!     resistance draw ──► motion change ──► cooldown
//! ```

use crate::registry::{OverrideRegistry, ProfileSource};
use crate::types::Vec3;
use crate::world::WorldHandle;
use log::debug;
use rand::rngs::ThreadRng;
use rand::Rng;

// ---------------------------------------------------------------------------
// Game-side boundary
// ---------------------------------------------------------------------------

/// A player or mob taking part in a fight.
pub trait Combatant {
    fn world(&self) -> WorldHandle;
    fn position(&self) -> Vec3;
    /// Knockback resistance attribute in `[0, 1]`.
    fn knockback_resistance(&self) -> f64;
    fn motion(&self) -> Vec3;
    fn set_motion(&mut self, motion: Vec3);
    fn attack_cooldown(&self) -> u32;
    fn set_attack_cooldown(&mut self, ticks: u32);
    /// Only player attackers pick up knockback overrides.
    fn is_player(&self) -> bool;
}

/// Where the damage came from, as far as knockback cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageCause {
    /// Direct hit from the attacking entity (melee, entity explosion).
    Entity,
    /// Hit by something the attacker launched; pushes along its motion.
    Projectile { motion: Vec3 },
    /// Fall, fire, void … no knockback.
    Environment,
}

pub trait DamageEvent {
    fn final_damage(&self) -> f64;
    /// Event's own knockback strength, used for non-player attackers.
    fn knockback_base(&self) -> f64;
    /// Event's own cooldown, used for non-player attackers.
    fn attack_cooldown(&self) -> u32;
    fn cause(&self) -> DamageCause;
    fn cancel(&mut self);
    fn is_cancelled(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Resistance draws
// ---------------------------------------------------------------------------

/// Source of the uniform draw compared against knockback resistance.
pub trait ResistanceRoll {
    /// A value in `[0, 1)`.
    fn sample(&mut self) -> f64;
}

impl<F: FnMut() -> f64> ResistanceRoll for F {
    fn sample(&mut self) -> f64 {
        self()
    }
}

/// Draws from any `rand` generator.
pub struct RandomRoll<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomRoll<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ResistanceRoll for RandomRoll<R> {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// Motion after a hit pushing along `(dx, dz)`.
///
/// Prior motion is halved, the normalized direction scaled by
/// `horizontal` is added on x/z and `vertical` on y; upward motion is
/// capped at `vertical`. Returns `None` for a zero direction.
pub fn knockback_motion(
    current: Vec3,
    dx: f64,
    dz: f64,
    horizontal: f64,
    vertical: f64,
) -> Option<Vec3> {
    let f = (dx * dx + dz * dz).sqrt();
    if f <= 0.0 || !f.is_finite() {
        return None;
    }
    let inv = 1.0 / f;

    let mut motion = Vec3::new(current.x / 2.0, current.y / 2.0, current.z / 2.0);
    motion.x += dx * inv * horizontal;
    motion.y += vertical;
    motion.z += dz * inv * horizontal;

    if motion.y > vertical {
        motion.y = vertical;
    }
    Some(motion)
}

// ---------------------------------------------------------------------------
// Applicator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    /// The event was cancelled before knockback; nothing changed.
    Cancelled,
    Applied {
        /// New defender motion, or `None` if no knockback was applied.
        motion: Option<Vec3>,
        attack_cooldown: u32,
        /// Where the profile came from; `None` when the event's own values
        /// were used (non-player attacker).
        source: Option<ProfileSource>,
    },
}

pub struct KnockbackApplicator<R: ResistanceRoll> {
    roll: R,
}

impl KnockbackApplicator<RandomRoll<ThreadRng>> {
    pub fn with_thread_rng() -> Self {
        Self::new(RandomRoll::new(rand::thread_rng()))
    }
}

impl<R: ResistanceRoll> KnockbackApplicator<R> {
    pub fn new(roll: R) -> Self {
        Self { roll }
    }

    /// True when the draw does not beat the resistance attribute, i.e. the
    /// knockback is negated.
    pub fn resists(&mut self, resistance: f64) -> bool {
        self.roll.sample() <= resistance
    }

    /// Compute the defender's new motion, or `None` for a zero direction or
    /// a resisted hit. Does not touch the defender.
    pub fn knockback(
        &mut self,
        defender: &dyn Combatant,
        dx: f64,
        dz: f64,
        horizontal: f64,
        vertical: f64,
    ) -> Option<Vec3> {
        if dx * dx + dz * dz <= 0.0 {
            return None;
        }
        if self.resists(defender.knockback_resistance()) {
            return None;
        }
        knockback_motion(defender.motion(), dx, dz, horizontal, vertical)
    }

    /// Apply one damage event to `defender`: motion first, then cooldown.
    pub fn apply_hit(
        &mut self,
        registry: &OverrideRegistry,
        event: &dyn DamageEvent,
        attacker: Option<&dyn Combatant>,
        defender: &mut dyn Combatant,
    ) -> HitOutcome {
        if event.is_cancelled() {
            return HitOutcome::Cancelled;
        }

        let resolved = attacker
            .filter(|a| a.is_player())
            .map(|a| registry.resolve_with_source(&*defender, a));

        let (horizontal, vertical) = match &resolved {
            Some(r) => (r.profile.horizontal(), r.profile.vertical()),
            None => (event.knockback_base(), event.knockback_base()),
        };

        let direction = match event.cause() {
            DamageCause::Entity => attacker.map(|a| {
                let from = a.position();
                let to = defender.position();
                (to.x - from.x, to.z - from.z)
            }),
            DamageCause::Projectile { motion } => Some((motion.x, motion.z)),
            DamageCause::Environment => None,
        };

        let motion = direction
            .and_then(|(dx, dz)| self.knockback(&*defender, dx, dz, horizontal, vertical));
        if let Some(m) = motion {
            defender.set_motion(m);
        }

        let attack_cooldown = resolved
            .as_ref()
            .map(|r| r.profile.attack_cooldown())
            .unwrap_or_else(|| event.attack_cooldown());
        defender.set_attack_cooldown(attack_cooldown);

        debug!(
            "Hit for {:.2}: motion={:?} cooldown={}t",
            event.final_damage(),
            motion,
            attack_cooldown
        );

        HitOutcome::Applied {
            motion,
            attack_cooldown,
            source: resolved.map(|r| r.source),
        }
    }
}
