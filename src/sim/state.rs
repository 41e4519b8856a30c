//! Game state and core simulation types
//!
//! `SimulationState` owns everything the tick mutates: the player, the live
//! mob and drop sets, the inventory and the equipped loadout. Renderers and
//! UI read it; only drag intents and the shoot/recall commands write to it
//! from outside the tick.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::drop::Drop;
use super::inventory::{DragIntent, DragOutcome, Inventory, Loadout, SlotRef, apply_drag};
use super::mob::{Mob, MobArchetype};
use super::petal::{Petal, PetalTemplate, SlotFilter};
use crate::tuning::{Tuning, TuningError};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player health reached zero; no further ticks are processed
    GameOver,
}

/// Things that happened during the last tick, for audio/UI feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    MobSpawned { id: u32, kind: String },
    MobKilled { id: u32, kind: String, pos: Vec2 },
    /// Mobs removed (without drops) to respect the population cap
    MobsCulled { count: usize },
    DropSpawned { id: u32, petal: String },
    DropCollected { id: u32, petal: String, slot: usize },
    DropExpired { id: u32 },
    /// Collected with a full inventory; the petal is gone
    DropLost { id: u32, petal: String },
    PlayerHit { mob_id: u32, damage: f32, health: f32 },
    GameOver { tick: u64 },
}

/// The player body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    /// Distance per frame per axis
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Forced displacement per frame while `knockback_timer > 0`
    pub knockback: Vec2,
    pub knockback_timer: u32,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            radius: tuning.player_radius,
            speed: tuning.player_speed,
            health: tuning.player_max_health,
            max_health: tuning.player_max_health,
            knockback: Vec2::ZERO,
            knockback_timer: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Health as a 0-1 fraction for HUD bars
    pub fn health_fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Move one frame. Knockback overrides movement input until it runs out.
    pub fn step(&mut self, movement: Vec2, map_size: Vec2) {
        if self.knockback_timer > 0 {
            self.pos += self.knockback;
            self.knockback_timer -= 1;
        } else {
            self.pos += movement.clamp(Vec2::NEG_ONE, Vec2::ONE) * self.speed;
        }
        let lo = Vec2::splat(self.radius);
        self.pos = self.pos.clamp(lo, map_size - lo);
    }

    /// Take contact damage and start a knockback. Health never drops below 0.
    pub fn take_hit(&mut self, damage: f32, knockback: Vec2, frames: u32) {
        self.health = (self.health - damage).clamp(0.0, self.max_health);
        self.knockback = knockback;
        self.knockback_timer = frames;
    }
}

/// Read-only view of everything a renderer draws
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub phase: GamePhase,
    pub player: &'a Player,
    pub mobs: &'a [Mob],
    pub drops: &'a [Drop],
    /// Only petals that are drawn (not reloading)
    pub petals: Vec<&'a Petal>,
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tuning: Tuning,
    archetypes: Vec<MobArchetype>,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player: Player,
    /// Live mobs
    pub mobs: Vec<Mob>,
    /// Live drops
    pub drops: Vec<Drop>,
    pub inventory: Inventory,
    pub loadout: Loadout,
    /// Rotating ring offset (degrees) used to seat newly equipped petals
    pub ring_offset: f32,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
    pending_drags: Vec<DragIntent>,
    next_id: u32,
}

impl SimulationState {
    /// New run with default tuning and the given seed
    pub fn new(seed: u64) -> Self {
        let tuning = Tuning {
            seed,
            ..Tuning::default()
        };
        let archetypes = tuning.mob_archetypes().unwrap_or_default();
        let starting = tuning.starting_petals().unwrap_or_default();
        Self::build(tuning, archetypes, starting)
    }

    /// New run from a tuning document
    pub fn from_tuning(tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        let archetypes = tuning.mob_archetypes()?;
        let starting = tuning.starting_petals()?;
        Ok(Self::build(tuning, archetypes, starting))
    }

    fn build(tuning: Tuning, archetypes: Vec<MobArchetype>, starting: Vec<PetalTemplate>) -> Self {
        let player = Player::new(tuning.map_size / 2.0, &tuning);
        let mut state = Self {
            rng: Pcg32::seed_from_u64(tuning.seed),
            archetypes,
            time_ticks: 0,
            phase: GamePhase::Playing,
            player,
            mobs: Vec::new(),
            drops: Vec::new(),
            inventory: Inventory::new(tuning.inventory_size()),
            loadout: Loadout::with_petals(tuning.loadout_size, &starting),
            ring_offset: 0.0,
            events: Vec::new(),
            pending_drags: Vec::new(),
            next_id: 1,
            tuning,
        };

        // Seat the ring around the player before the first frame
        let orbit = state.tuning.orbit_radius;
        let anchor = state.player.pos;
        for petal in state.loadout.petals_mut() {
            petal.pos = petal.ring_position(anchor, orbit);
        }

        state.populate();
        log::info!(
            "New run: seed={}, mobs={}, archetypes={}",
            state.tuning.seed,
            state.mobs.len(),
            state.archetypes.len()
        );
        state
    }

    /// Scatter the initial mobs across the map, cycling through archetypes
    fn populate(&mut self) {
        if self.archetypes.is_empty() {
            return;
        }
        for i in 0..self.tuning.initial_mobs {
            let idx = i % self.archetypes.len();
            let r = self.archetypes[idx].radius;
            let hi = self.tuning.map_size - Vec2::splat(r);
            let pos = Vec2::new(
                self.rng.random_range(r..=hi.x),
                self.rng.random_range(r..=hi.y),
            );
            self.spawn_mob(idx, pos);
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn archetypes(&self) -> &[MobArchetype] {
        &self.archetypes
    }

    /// Spawn a mob from archetype `index` at `pos`. Returns its id.
    pub fn spawn_mob(&mut self, index: usize, pos: Vec2) -> Option<u32> {
        if index >= self.archetypes.len() {
            return None;
        }
        let id = self.next_entity_id();
        let archetype = &self.archetypes[index];
        let mob = Mob::from_archetype(id, archetype, pos);
        log::debug!("Spawned {} #{} at ({:.0}, {:.0})", mob.kind, id, pos.x, pos.y);
        self.events.push(GameEvent::MobSpawned {
            id,
            kind: mob.kind.clone(),
        });
        self.mobs.push(mob);
        Some(id)
    }

    /// Orbit radius for this frame: extended while the fire input is held
    pub fn orbit_radius(&self, firing: bool) -> f32 {
        if firing {
            self.tuning.orbit_radius_extended
        } else {
            self.tuning.orbit_radius
        }
    }

    /// Launch every shootable, orbiting loadout petal the filter selects.
    /// Returns how many left the ring.
    pub fn shoot(&mut self, filter: SlotFilter) -> usize {
        let anchor = self.player.pos;
        self.loadout
            .petals_mut()
            .filter(|p| filter.accepts(p.slot))
            .map(|p| p.shoot(anchor))
            .filter(|&launched| launched)
            .count()
    }

    /// Bring every shot petal home on its next update
    pub fn recall_all(&mut self) {
        for petal in self.loadout.petals_mut() {
            petal.recall();
        }
    }

    /// Queue a UI drag; applied atomically at the start of the next tick
    pub fn queue_drag(&mut self, intent: DragIntent) {
        self.pending_drags.push(intent);
    }

    /// Apply a drag right now (between ticks)
    pub fn apply_drag(&mut self, intent: DragIntent) -> DragOutcome {
        let outcome = apply_drag(&mut self.inventory, &mut self.loadout, intent, self.ring_offset);
        if let (DragOutcome::Moved, Some(SlotRef::Loadout(slot))) = (outcome, intent.to) {
            self.seat_petal(slot);
        }
        outcome
    }

    /// Place a freshly equipped petal on the ring so it is drawn correctly
    /// before its first update
    fn seat_petal(&mut self, slot: usize) {
        let anchor = self.player.pos;
        let orbit = self.tuning.orbit_radius;
        if let Some(petal) = self.loadout.petals_mut().find(|p| p.slot == slot) {
            petal.pos = petal.ring_position(anchor, orbit);
        }
    }

    pub(crate) fn apply_pending_drags(&mut self) {
        for intent in std::mem::take(&mut self.pending_drags) {
            self.apply_drag(intent);
        }
    }

    /// Petals that should be drawn this frame
    pub fn visible_petals(&self) -> impl Iterator<Item = &Petal> {
        self.loadout.petals().filter(|p| p.is_active())
    }

    /// Top-left world coordinate of a viewport centred on the player,
    /// clamped so it never shows outside the map
    pub fn camera_origin(&self, viewport: Vec2) -> Vec2 {
        let origin = self.player.pos - viewport / 2.0;
        let max = (self.tuning.map_size - viewport).max(Vec2::ZERO);
        origin.clamp(Vec2::ZERO, max)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            player: &self.player,
            mobs: &self.mobs,
            drops: &self.drops,
            petals: self.visible_petals().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(12345);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.mobs.len(), 10);
        assert_eq!(state.loadout.petals().count(), 8);
        assert_eq!(state.inventory.len(), 20);
        assert_eq!(state.player.pos, Vec2::splat(1000.0));
        for mob in &state.mobs {
            assert!(mob.pos.x >= mob.radius && mob.pos.x <= 2000.0 - mob.radius);
        }
    }

    #[test]
    fn test_player_clamped_to_map() {
        let tuning = Tuning::default();
        let mut player = Player::new(Vec2::new(22.0, 1000.0), &tuning);
        player.step(Vec2::new(-1.0, 0.0), tuning.map_size);
        assert_eq!(player.pos.x, 20.0);
    }

    #[test]
    fn test_player_health_floor() {
        let tuning = Tuning::default();
        let mut player = Player::new(Vec2::splat(500.0), &tuning);
        player.take_hit(5000.0, Vec2::X * 10.0, 15);
        assert_eq!(player.health, 0.0);
        assert!(player.is_dead());
    }

    #[test]
    fn test_camera_origin_clamps() {
        let mut state = SimulationState::new(1);
        let viewport = Vec2::new(800.0, 600.0);
        assert_eq!(state.camera_origin(viewport), Vec2::new(600.0, 700.0));
        state.player.pos = Vec2::new(20.0, 1990.0);
        assert_eq!(state.camera_origin(viewport), Vec2::new(0.0, 1400.0));
    }

    #[test]
    fn test_shoot_only_launches_shootable() {
        let mut state = SimulationState::new(1);
        assert_eq!(state.shoot(SlotFilter::All), 0);

        let missile = state.tuning.petal("Missile").cloned().unwrap();
        state.loadout.take(3);
        state.loadout.place(3, missile, 0.0).unwrap();
        state.seat_petal(3);
        assert_eq!(state.shoot(SlotFilter::Only(2)), 0);
        assert_eq!(state.shoot(SlotFilter::Only(3)), 1);
        assert_eq!(state.shoot(SlotFilter::All), 0);
    }

    #[test]
    fn test_apply_drag_seats_petal_on_ring() {
        let mut state = SimulationState::new(1);
        let stinger = state.tuning.petal("Stinger").cloned().unwrap();
        state.inventory.merge(stinger).unwrap();
        state.loadout.take(0);
        let outcome = state.apply_drag(DragIntent {
            from: SlotRef::Inventory(0),
            to: Some(SlotRef::Loadout(0)),
        });
        assert_eq!(outcome, DragOutcome::Moved);
        let petal = state.loadout.petal(0).unwrap();
        assert!((petal.pos.distance(state.player.pos) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = SimulationState::new(3);
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
