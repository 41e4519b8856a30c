//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed 60 Hz frame step; every timer counts frames
//! - Seeded RNG only
//! - Stable iteration order (spawn order for mobs and drops, slot order for petals)
//! - No rendering or platform dependencies

pub mod collision;
pub mod drop;
pub mod inventory;
pub mod mob;
pub mod petal;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, circle_collision};
pub use drop::Drop;
pub use inventory::{
    DragIntent, DragOutcome, Inventory, InventorySlot, Loadout, LoadoutSlot, SlotRef, apply_drag,
};
pub use mob::{Mob, MobArchetype, separate_mobs};
pub use petal::{Petal, PetalState, PetalTemplate, Rarity, SlotFilter};
pub use state::{GameEvent, GamePhase, Player, SimulationState, Snapshot};
pub use tick::{TickInput, tick};
