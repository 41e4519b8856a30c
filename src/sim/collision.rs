//! Collision detection and combat resolution
//!
//! Everything here is circle-vs-circle. Resolution runs once per tick after
//! movement, in a fixed order: petals vs mobs, mobs vs player, mobs vs mobs,
//! drops vs player.

use glam::Vec2;

use super::drop::Drop;
use super::inventory::{Inventory, Loadout};
use super::mob::Mob;
use super::state::{GameEvent, Player};
use crate::{circles_overlap, direction_to};

/// Result of a circle overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the circles overlap
    pub hit: bool,
    /// Unit normal from the first circle toward the second
    pub normal: Vec2,
    /// Overlap depth
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check two circles for overlap, with contact normal and depth
pub fn circle_collision(a: Vec2, ra: f32, b: Vec2, rb: f32) -> CollisionResult {
    let delta = b - a;
    let dist = delta.length();
    let reach = ra + rb;
    if dist >= reach {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        normal: delta.normalize_or_zero(),
        penetration: reach - dist,
    }
}

/// Strike mobs with every active loadout petal touching them.
///
/// A struck mob turns angry; a struck petal goes through its hit sequence
/// (a shot petal snaps home first, then reloads). A mob stops taking hits the
/// moment it dies, so one kill never consumes extra petals or yields two
/// drops. Dead mobs are compacted out of `mobs` once and returned.
pub fn petals_vs_mobs(
    mobs: &mut Vec<Mob>,
    loadout: &mut Loadout,
    anchor: Vec2,
    orbit_radius: f32,
) -> Vec<Mob> {
    for mob in mobs.iter_mut() {
        for petal in loadout.petals_mut() {
            if mob.is_dead() {
                break;
            }
            if !petal.is_active() {
                continue;
            }
            if circles_overlap(mob.pos, mob.radius, petal.pos, petal.template.radius) {
                mob.take_hit(petal.template.damage);
                petal.register_hit(anchor, orbit_radius);
            }
        }
    }

    if !mobs.iter().any(Mob::is_dead) {
        return Vec::new();
    }
    let (dead, alive): (Vec<Mob>, Vec<Mob>) = std::mem::take(mobs).into_iter().partition(Mob::is_dead);
    *mobs = alive;
    dead
}

/// Apply contact damage and knockback from every mob touching the player.
///
/// Returns true if the player died; remaining mobs are not processed then.
pub fn mobs_vs_player(
    mobs: &[Mob],
    player: &mut Player,
    knockback_frames: u32,
    knockback_speed: f32,
    events: &mut Vec<GameEvent>,
) -> bool {
    for mob in mobs {
        if !circles_overlap(mob.pos, mob.radius, player.pos, player.radius) {
            continue;
        }
        let away = direction_to(mob.pos, player.pos).normalize_or(Vec2::X);
        player.take_hit(mob.damage, away * knockback_speed, knockback_frames);
        events.push(GameEvent::PlayerHit {
            mob_id: mob.id,
            damage: mob.damage,
            health: player.health,
        });
        if player.is_dead() {
            return true;
        }
    }
    false
}

/// Age drops, expire the stale ones, and collect the ones the player touches.
///
/// Collected petals stack into the inventory; with no room they are lost.
pub fn drops_vs_player(
    drops: &mut Vec<Drop>,
    player: &Player,
    inventory: &mut Inventory,
    events: &mut Vec<GameEvent>,
) {
    drops.retain_mut(|drop| {
        if drop.age() {
            events.push(GameEvent::DropExpired { id: drop.id });
            return false;
        }
        if !circles_overlap(drop.pos, drop.radius, player.pos, player.radius) {
            return true;
        }
        match inventory.merge(drop.petal.clone()) {
            Ok(slot) => {
                log::debug!(
                    "Collected {} {} into slot {}",
                    drop.petal.rarity.as_str(),
                    drop.petal.name,
                    slot
                );
                events.push(GameEvent::DropCollected {
                    id: drop.id,
                    petal: drop.petal.name.clone(),
                    slot,
                });
            }
            Err(petal) => {
                log::warn!("Inventory full, {} {} lost", petal.rarity.as_str(), petal.name);
                events.push(GameEvent::DropLost {
                    id: drop.id,
                    petal: petal.name,
                });
            }
        }
        false
    });
}
