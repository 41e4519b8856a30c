//! Loot left behind by dead mobs

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::petal::PetalTemplate;
use crate::consts::DROP_RADIUS;

/// A petal lying on the map, waiting to be collected or to expire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drop {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub petal: PetalTemplate,
    /// Frames left; removed once it goes negative
    pub ttl: i32,
}

impl Drop {
    pub fn new(id: u32, pos: Vec2, petal: PetalTemplate, ttl: i32) -> Self {
        Self {
            id,
            pos,
            radius: DROP_RADIUS,
            petal,
            ttl,
        }
    }

    /// Count down one frame. Returns true once the drop has expired.
    pub fn age(&mut self) -> bool {
        self.ttl -= 1;
        self.ttl < 0
    }
}
