//! Petals: the orbiting ring of projectiles around the player
//!
//! A petal cycles Orbiting -> Shot -> Orbiting, and drops into Reloading
//! (hidden, harmless) for a fixed number of frames after it hits a mob.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{orbit_offset, wrap_degrees};

/// Rarity tier; part of a petal's stacking identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Unusual,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Unusual => "Unusual",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }
}

fn default_return_duration() -> u32 {
    60
}

fn default_shot_speed() -> f32 {
    PETAL_SHOT_SPEED
}

fn default_radius() -> f32 {
    PETAL_RADIUS
}

/// Static attributes of a petal kind (inventory items, drops, loadout rebuilds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetalTemplate {
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// RGB display color
    #[serde(default)]
    pub color: [u8; 3],
    /// Frames hidden after hitting a mob
    pub reload: u32,
    #[serde(default)]
    pub shootable: bool,
    /// Pollen-style petals lose speed while in flight
    #[serde(default)]
    pub decelerating: bool,
    /// Frames a shot petal flies before snapping back to the ring
    #[serde(default = "default_return_duration")]
    pub return_duration: u32,
    pub damage: f32,
    #[serde(default = "default_shot_speed")]
    pub shot_speed: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
}

impl PetalTemplate {
    pub fn new(name: &str, rarity: Rarity, reload: u32, damage: f32) -> Self {
        Self {
            name: name.to_string(),
            rarity,
            color: [216, 216, 216],
            reload,
            shootable: false,
            decelerating: false,
            return_duration: default_return_duration(),
            damage,
            shot_speed: PETAL_SHOT_SPEED,
            radius: PETAL_RADIUS,
        }
    }

    /// Two templates stack together iff name and rarity match
    pub fn same_kind(&self, other: &PetalTemplate) -> bool {
        self.name == other.name && self.rarity == other.rarity
    }
}

/// Lifecycle state of a live petal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetalState {
    /// Riding the ring around the player
    Orbiting,
    /// Flying outward after a shot
    Shot,
    /// Hidden and harmless after a hit
    Reloading,
}

/// Which loadout petals a shot command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotFilter {
    #[default]
    All,
    Only(usize),
}

impl SlotFilter {
    pub fn accepts(&self, slot: usize) -> bool {
        match self {
            SlotFilter::All => true,
            SlotFilter::Only(s) => *s == slot,
        }
    }
}

/// A live petal equipped in a loadout slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Petal {
    pub template: PetalTemplate,
    /// Orbit angle in degrees, [0, 360)
    pub angle: f32,
    pub state: PetalState,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames left in flight (counts down while Shot)
    pub return_timer: i32,
    /// Frames left hidden (counts down while Reloading)
    pub reload_timer: i32,
    /// Owning loadout slot
    pub slot: usize,
}

impl Petal {
    /// Fresh petal from a template. Always starts Orbiting with no residual motion.
    pub fn new(template: PetalTemplate, angle: f32, slot: usize) -> Self {
        Self {
            template,
            angle: wrap_degrees(angle),
            state: PetalState::Orbiting,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            return_timer: 0,
            reload_timer: 0,
            slot,
        }
    }

    /// Angle a newly equipped petal takes in the ring
    pub fn slot_angle(slot: usize, slot_count: usize, ring_offset: f32) -> f32 {
        let spacing = (360 / slot_count.max(1)) as f32;
        wrap_degrees(slot as f32 * spacing + ring_offset)
    }

    /// Where this petal sits on the ring this frame
    pub fn ring_position(&self, anchor: Vec2, orbit_radius: f32) -> Vec2 {
        anchor + orbit_offset(orbit_radius, self.angle)
    }

    /// Reloading petals are neither drawn nor collidable
    pub fn is_active(&self) -> bool {
        self.state != PetalState::Reloading
    }

    /// Advance one frame
    pub fn update(&mut self, anchor: Vec2, orbit_radius: f32, rotation_speed: f32) {
        self.angle = wrap_degrees(self.angle + rotation_speed);

        match self.state {
            PetalState::Orbiting => {
                self.pos = self.ring_position(anchor, orbit_radius);
            }
            PetalState::Shot => {
                if self.template.decelerating {
                    self.vel *= PETAL_DECEL;
                }
                self.pos += self.vel;
                self.return_timer -= 1;
                if self.return_timer <= 0 {
                    self.return_timer = 0;
                    self.state = PetalState::Orbiting;
                    self.pos = self.ring_position(anchor, orbit_radius);
                }
            }
            PetalState::Reloading => {
                self.pos = self.ring_position(anchor, orbit_radius);
                self.reload_timer -= 1;
                if self.reload_timer <= 0 {
                    self.reload_timer = 0;
                    self.state = PetalState::Orbiting;
                }
            }
        }
    }

    /// Launch radially outward from the anchor along the petal's current position.
    ///
    /// Returns true if the petal left the ring.
    pub fn shoot(&mut self, anchor: Vec2) -> bool {
        if !self.template.shootable || self.state != PetalState::Orbiting {
            return false;
        }
        let dir = (self.pos - anchor).normalize_or(orbit_offset(1.0, self.angle));
        self.vel = dir * self.template.shot_speed;
        self.return_timer = self.template.return_duration as i32;
        self.state = PetalState::Shot;
        true
    }

    /// Zero the flight timer so a shot petal comes home on its next update
    pub fn recall(&mut self) {
        if self.state == PetalState::Shot {
            self.return_timer = 0;
        }
    }

    /// Snap a shot petal back onto the ring immediately
    pub fn force_return(&mut self, anchor: Vec2, orbit_radius: f32) {
        if self.state == PetalState::Shot {
            self.return_timer = 0;
            self.vel = Vec2::ZERO;
            self.state = PetalState::Orbiting;
            self.pos = self.ring_position(anchor, orbit_radius);
        }
    }

    /// Enter Reloading after striking a mob. No-op while already reloading.
    pub fn hit_mob(&mut self) {
        if self.state == PetalState::Reloading {
            return;
        }
        self.state = PetalState::Reloading;
        self.reload_timer = self.template.reload as i32;
    }

    /// Full hit sequence: a shot petal returns to the ring first, then reloads
    pub fn register_hit(&mut self, anchor: Vec2, orbit_radius: f32) {
        self.force_return(anchor, orbit_radius);
        self.hit_mob();
    }
}
