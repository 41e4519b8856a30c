//! Mobs: wandering creatures that turn aggressive once struck
//!
//! Movement is frame-based: integrate, clamp speed, bounce off the map edge,
//! then steer (toward the player when angry, random jitter otherwise).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::circle_collision;
use super::petal::PetalTemplate;
use crate::consts::MOB_BOUNCE;
use crate::direction_to;

/// Spawn template for a kind of mob. Every mob spawned from it owns a copy of
/// the drop table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobArchetype {
    pub name: String,
    pub radius: f32,
    pub health: f32,
    pub speed: f32,
    /// Damage dealt to the player per contact frame
    pub damage: f32,
    pub spawn_point: Vec2,
    /// Chance per tick of spawning one mob at `spawn_point`
    pub spawn_chance: f64,
    pub drop_table: Vec<PetalTemplate>,
}

/// A live mob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mob {
    pub id: u32,
    pub kind: String,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Per-axis velocity cap
    pub speed: f32,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    /// Set permanently once any petal strikes this mob
    pub angry: bool,
    pub drop_table: Vec<PetalTemplate>,
}

impl Mob {
    pub fn from_archetype(id: u32, archetype: &MobArchetype, pos: Vec2) -> Self {
        Self {
            id,
            kind: archetype.name.clone(),
            pos,
            vel: Vec2::ZERO,
            speed: archetype.speed,
            radius: archetype.radius,
            health: archetype.health,
            max_health: archetype.health,
            damage: archetype.damage,
            angry: false,
            drop_table: archetype.drop_table.clone(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Heading for sprite rotation (radians)
    pub fn heading(&self) -> f32 {
        self.vel.y.atan2(self.vel.x)
    }

    /// Apply petal damage and provoke the mob
    pub fn take_hit(&mut self, damage: f32) {
        self.health -= damage.max(0.0);
        self.angry = true;
    }

    /// Advance one frame
    pub fn update<R: Rng>(&mut self, player_pos: Vec2, map_size: Vec2, rng: &mut R) {
        self.pos += self.vel;
        let cap = Vec2::splat(self.speed);
        self.vel = self.vel.clamp(-cap, cap);

        self.bounce(map_size);

        let accel = self.speed / 10.0;
        if self.angry {
            self.vel += direction_to(self.pos, player_pos) * accel;
        } else {
            let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5);
            self.vel += jitter * accel;
        }
    }

    /// Clamp into the map and reflect velocity on any axis that crossed an edge
    fn bounce(&mut self, map_size: Vec2) {
        let lo = Vec2::splat(self.radius);
        let hi = map_size - lo;
        if self.pos.x < lo.x || self.pos.x > hi.x {
            self.pos.x = self.pos.x.clamp(lo.x, hi.x);
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < lo.y || self.pos.y > hi.y {
            self.pos.y = self.pos.y.clamp(lo.y, hi.y);
            self.vel.y = -self.vel.y;
        }
    }

    /// Clamp into the map without touching velocity
    pub fn contain(&mut self, map_size: Vec2) {
        let lo = Vec2::splat(self.radius);
        self.pos = self.pos.clamp(lo, map_size - lo);
    }
}

/// Push overlapping mobs apart along the contact normal.
///
/// O(n²) over the live set; the population cap keeps n small.
pub fn separate_mobs(mobs: &mut [Mob], map_size: Vec2) {
    for i in 0..mobs.len() {
        let (head, tail) = mobs.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            let contact = circle_collision(a.pos, a.radius, b.pos, b.radius);
            // coincident centres have no normal; leave them to drift apart
            if !contact.hit || contact.normal == Vec2::ZERO {
                continue;
            }
            let push = contact.normal * contact.penetration / 2.0;
            a.pos -= push;
            b.pos += push;
            a.vel -= contact.normal * MOB_BOUNCE;
            b.vel += contact.normal * MOB_BOUNCE;
        }
    }
    for mob in mobs.iter_mut() {
        mob.contain(map_size);
    }
}
