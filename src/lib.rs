//! Petal Arena - a top-down arena game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (petals, mobs, drops, combat, game state)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate; every timer in the sim counts frames at this rate
    pub const SIM_HZ: u32 = 60;

    /// Map dimensions (square arena)
    pub const MAP_SIZE: f32 = 2000.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 20.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_MAX_HEALTH: f32 = 1000.0;

    /// Knockback after a mob hit: frames of forced movement and distance per frame
    pub const KNOCKBACK_FRAMES: u32 = 15;
    pub const KNOCKBACK_SPEED: f32 = 10.0;

    /// Petal ring defaults
    pub const PETAL_COUNT: usize = 8;
    pub const ORBIT_RADIUS: f32 = 50.0;
    /// Orbit radius while the fire input is held
    pub const ORBIT_RADIUS_EXTENDED: f32 = 80.0;
    /// Degrees per frame
    pub const ROTATION_SPEED: f32 = 2.0;
    pub const PETAL_RADIUS: f32 = 10.0;
    pub const PETAL_SHOT_SPEED: f32 = 10.0;
    /// Velocity multiplier per frame for decelerating (pollen) petals
    pub const PETAL_DECEL: f32 = 0.9;

    /// Drop defaults
    pub const DROP_RADIUS: f32 = 8.0;
    pub const DROP_TTL: i32 = 600;
    /// Drops land within ±DROP_JITTER of the dead mob on each axis
    pub const DROP_JITTER: f32 = 20.0;

    /// Mob population
    pub const MOB_CAP: usize = 100;
    pub const INITIAL_MOBS: usize = 10;
    pub const SPAWN_CHANCE: f64 = 0.01;
    /// Velocity impulse applied to both mobs when they overlap
    pub const MOB_BOUNCE: f32 = 0.5;

    /// Inventory grid
    pub const INVENTORY_ROWS: usize = 5;
    pub const INVENTORY_COLS: usize = 4;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Offset of a point on a circle of `radius` at `degrees`
#[inline]
pub fn orbit_offset(radius: f32, degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(radius * rad.cos(), radius * rad.sin())
}

/// Unit-ish direction from `from` toward `to`.
///
/// The distance is floored at 1 so coincident points never divide by zero;
/// for points closer than 1 unit the result is shorter than unit length.
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    delta / delta.length().max(1.0)
}

/// Strict circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}
