//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation one frame deterministically.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::collision::{drops_vs_player, mobs_vs_player, petals_vs_mobs};
use super::drop::Drop;
use super::mob::separate_mobs;
use super::petal::SlotFilter;
use super::state::{GameEvent, GamePhase, SimulationState};
use crate::{direction_to, wrap_degrees};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement intent, each axis in [-1, 1]
    pub movement: Vec2,
    /// Fire held: launch shootable petals and widen the ring
    pub fire: bool,
    /// Recall held: bring shot petals home
    pub recall: bool,
    /// Idle/demo mode - the sim steers the player itself
    pub idle_mode: bool,
}

/// Advance the game state by one frame. Returns the phase after the tick;
/// once it is `GameOver` further calls do nothing.
pub fn tick(state: &mut SimulationState, input: &TickInput) -> GamePhase {
    if state.phase == GamePhase::GameOver {
        return state.phase;
    }

    state.events.clear();
    state.apply_pending_drags();

    let input = if input.idle_mode {
        autopilot(state)
    } else {
        input.clone()
    };

    state.time_ticks += 1;
    let map_size = state.tuning.map_size;

    // Player
    state.player.step(input.movement, map_size);
    let anchor = state.player.pos;

    // Petal commands use last frame's positions
    if input.fire {
        state.shoot(SlotFilter::All);
    }
    if input.recall {
        state.recall_all();
    }

    // Petals
    let orbit_radius = state.orbit_radius(input.fire);
    let rotation = state.tuning.rotation_speed;
    state.ring_offset = wrap_degrees(state.ring_offset + rotation);
    for petal in state.loadout.petals_mut() {
        petal.update(anchor, orbit_radius, rotation);
    }

    // Mobs
    for mob in &mut state.mobs {
        mob.update(anchor, map_size, &mut state.rng);
    }

    // --- Combat ---
    let dead = petals_vs_mobs(&mut state.mobs, &mut state.loadout, anchor, orbit_radius);
    for mob in dead {
        log::debug!("{} #{} killed", mob.kind, mob.id);
        state.events.push(GameEvent::MobKilled {
            id: mob.id,
            kind: mob.kind.clone(),
            pos: mob.pos,
        });
        let Some(petal) = mob.drop_table.choose(&mut state.rng).cloned() else {
            continue;
        };
        let jitter = state.tuning.drop_jitter;
        let offset = Vec2::new(
            state.rng.random_range(-jitter..=jitter),
            state.rng.random_range(-jitter..=jitter),
        );
        let id = state.next_entity_id();
        state.events.push(GameEvent::DropSpawned {
            id,
            petal: petal.name.clone(),
        });
        state
            .drops
            .push(Drop::new(id, mob.pos + offset, petal, state.tuning.drop_ttl));
    }

    let died = mobs_vs_player(
        &state.mobs,
        &mut state.player,
        state.tuning.knockback_frames,
        state.tuning.knockback_speed,
        &mut state.events,
    );
    if died {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            tick: state.time_ticks,
        });
        log::info!(
            "Game over at tick {} with {} petals in inventory",
            state.time_ticks,
            state.inventory.slots().iter().filter(|s| !s.is_empty()).count()
        );
        return state.phase;
    }

    separate_mobs(&mut state.mobs, map_size);

    drops_vs_player(
        &mut state.drops,
        &state.player,
        &mut state.inventory,
        &mut state.events,
    );

    manage_population(state);

    state.phase
}

/// Roll spawns for every archetype, then trim back to the cap
fn manage_population(state: &mut SimulationState) {
    for index in 0..state.archetypes().len() {
        let (chance, point) = {
            let a = &state.archetypes()[index];
            (a.spawn_chance, a.spawn_point)
        };
        if state.rng.random_bool(chance) {
            state.spawn_mob(index, point);
        }
    }

    let cap = state.tuning.mob_cap;
    if state.mobs.len() > cap {
        let count = state.mobs.len() - cap;
        state.mobs.truncate(cap);
        log::debug!("Culled {count} mobs over cap {cap}");
        state.events.push(GameEvent::MobsCulled { count });
    }
}

/// Demo-mode driver: flee angry mobs, pick up loot, otherwise hunt
fn autopilot(state: &SimulationState) -> TickInput {
    let me = state.player.pos;
    let threat = nearest(me, state.mobs.iter().filter(|m| m.angry).map(|m| m.pos))
        .filter(|p| p.distance(me) < 150.0);
    let loot = nearest(me, state.drops.iter().map(|d| d.pos));
    let prey = nearest(me, state.mobs.iter().map(|m| m.pos));

    let movement = match (threat, loot, prey) {
        (Some(t), _, _) => -direction_to(me, t),
        (None, Some(l), _) => direction_to(me, l),
        (None, None, Some(p)) => direction_to(me, p),
        (None, None, None) => Vec2::ZERO,
    };
    let fire = prey.is_some_and(|p| p.distance(me) < 200.0);

    TickInput {
        movement,
        fire,
        recall: !fire,
        idle_mode: true,
    }
}

fn nearest(me: Vec2, points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    points.min_by(|a, b| {
        a.distance_squared(me)
            .partial_cmp(&b.distance_squared(me))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{DragIntent, Mob, PetalState, SlotRef};
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Default world with no mobs and no spawning
    fn quiet_state(seed: u64) -> SimulationState {
        let mut tuning = Tuning {
            seed,
            initial_mobs: 0,
            ..Tuning::default()
        };
        for a in &mut tuning.archetypes {
            a.spawn_chance = 0.0;
        }
        SimulationState::from_tuning(tuning).unwrap()
    }

    fn bee_at(state: &mut SimulationState, pos: Vec2) -> u32 {
        state.spawn_mob(0, pos).unwrap()
    }

    #[test]
    fn test_tick_counts_and_rotates() {
        let mut state = quiet_state(1);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.ring_offset, 2.0);
        let petal = state.loadout.petal(0).unwrap();
        assert_eq!(petal.angle, 2.0);
    }

    #[test]
    fn test_player_moves_with_input() {
        let mut state = quiet_state(1);
        let input = TickInput {
            movement: Vec2::new(1.0, -1.0),
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(state.player.pos, Vec2::new(1005.0, 995.0));
    }

    #[test]
    fn test_mob_contact_scenario() {
        let mut state = quiet_state(2);
        state.loadout = crate::sim::Loadout::new(8);
        bee_at(&mut state, Vec2::new(1000.0, 1050.0));

        tick(&mut state, &TickInput::default());
        assert_eq!(state.player.health, 950.0);
        assert_eq!(state.player.knockback_timer, 15);

        state.mobs.clear();
        let start = state.player.pos;
        let knockback = state.player.knockback;
        let input = TickInput {
            movement: Vec2::X,
            ..Default::default()
        };
        for _ in 0..15 {
            tick(&mut state, &input);
        }
        assert_eq!(state.player.knockback_timer, 0);
        assert!((state.player.pos - (start + knockback * 15.0)).length() < 1e-3);

        let before = state.player.pos;
        tick(&mut state, &input);
        assert!((state.player.pos - (before + Vec2::new(5.0, 0.0))).length() < 1e-3);
    }

    #[test]
    fn test_petal_kill_scenario() {
        let mut state = quiet_state(3);
        let missile = state.tuning.petal("Missile").cloned().unwrap();
        state.loadout.take(0);
        state.loadout.place(0, missile, 0.0).unwrap();
        // petal will sit at 2 degrees on a 50 unit ring after the tick
        let id = bee_at(&mut state, Vec2::new(1050.0, 1000.0));
        state.mobs[0].health = 37.0;

        tick(&mut state, &TickInput::default());

        assert!(state.mobs.iter().all(|m| m.id != id));
        assert_eq!(state.drops.len(), 1);
        let drop = &state.drops[0];
        let table = &state.archetypes()[0].drop_table;
        assert!(table.iter().any(|t| t.same_kind(&drop.petal)));
        assert!((drop.pos - Vec2::new(1050.0, 1000.0)).abs().max_element() <= 20.0 + 1e-3);
        assert_eq!(state.loadout.petal(0).unwrap().state, PetalState::Reloading);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::MobKilled { id: k, .. } if *k == id)));
    }

    #[test]
    fn test_shot_petal_hit_returns_then_reloads() {
        let mut state = quiet_state(4);
        state.loadout = crate::sim::Loadout::new(8);
        let missile = state.tuning.petal("Missile").cloned().unwrap();
        state.loadout.place(0, missile, 0.0).unwrap();
        tick(&mut state, &TickInput::default());

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire);
        assert_eq!(state.loadout.petal(0).unwrap().state, PetalState::Shot);

        // put a tough mob right in the flight path
        let petal_pos = state.loadout.petal(0).unwrap().pos;
        let vel = state.loadout.petal(0).unwrap().vel;
        bee_at(&mut state, petal_pos + vel * 3.0);
        state.mobs[0].health = 1000.0;

        let mut saw_reload = false;
        for _ in 0..5 {
            tick(&mut state, &TickInput::default());
            let petal = state.loadout.petal(0).unwrap();
            if petal.state == PetalState::Reloading {
                saw_reload = true;
                assert_eq!(petal.return_timer, 0);
                assert!((petal.pos.distance(state.player.pos) - 50.0).abs() < 1e-2);
                break;
            }
        }
        assert!(saw_reload);
        assert!(state.mobs[0].angry);
    }

    #[test]
    fn test_recall_brings_petals_home() {
        let mut state = quiet_state(5);
        let missile = state.tuning.petal("Missile").cloned().unwrap();
        state.loadout.take(0);
        state.loadout.place(0, missile, 0.0).unwrap();
        tick(&mut state, &TickInput::default());
        tick(
            &mut state,
            &TickInput {
                fire: true,
                ..Default::default()
            },
        );
        assert_eq!(state.loadout.petal(0).unwrap().state, PetalState::Shot);
        tick(
            &mut state,
            &TickInput {
                recall: true,
                ..Default::default()
            },
        );
        assert_eq!(state.loadout.petal(0).unwrap().state, PetalState::Orbiting);
    }

    #[test]
    fn test_fire_widens_ring() {
        let mut state = quiet_state(6);
        tick(
            &mut state,
            &TickInput {
                fire: true,
                ..Default::default()
            },
        );
        let petal = state.loadout.petal(0).unwrap();
        assert!((petal.pos.distance(state.player.pos) - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_drop_ttl_scenario() {
        let mut state = quiet_state(7);
        let pollen = state.tuning.petal("Pollen").cloned().unwrap();
        let id = state.next_entity_id();
        state.drops.push(Drop::new(id, Vec2::new(200.0, 200.0), pollen, 600));

        for _ in 0..600 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.drops.len(), 1);
        tick(&mut state, &TickInput::default());
        assert!(state.drops.is_empty());
        assert!(state.events.contains(&GameEvent::DropExpired { id }));
        assert!(state.inventory.slots().iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_collecting_drop_stacks_into_inventory() {
        let mut state = quiet_state(8);
        let pollen = state.tuning.petal("Pollen").cloned().unwrap();
        for _ in 0..2 {
            let id = state.next_entity_id();
            state.drops.push(Drop::new(id, state.player.pos, pollen.clone(), 600));
        }
        tick(&mut state, &TickInput::default());
        assert!(state.drops.is_empty());
        assert_eq!(state.inventory.count_of(&pollen), 2);
        assert!(!state.inventory.slots()[1..].iter().any(|s| !s.is_empty()));
    }

    #[test]
    fn test_population_cap_scenario() {
        let mut tuning = Tuning {
            seed: 9,
            initial_mobs: 0,
            mob_cap: 100,
            ..Tuning::default()
        };
        // spawning always succeeds
        tuning.archetypes[0].spawn_chance = 1.0;
        let mut state = SimulationState::from_tuning(tuning).unwrap();
        state.loadout = crate::sim::Loadout::new(8);
        for i in 0..100 {
            let pos = Vec2::new(100.0 + (i % 10) as f32 * 85.0, 100.0 + (i / 10) as f32 * 85.0);
            bee_at(&mut state, pos);
        }

        tick(&mut state, &TickInput::default());
        assert_eq!(state.mobs.len(), 100);
        assert!(state.events.contains(&GameEvent::MobsCulled { count: 1 }));
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut state = quiet_state(10);
        state.loadout = crate::sim::Loadout::new(8);
        state.player.health = 10.0;
        let pos = state.player.pos;
        bee_at(&mut state, pos);

        assert_eq!(tick(&mut state, &TickInput::default()), GamePhase::GameOver);
        assert_eq!(state.player.health, 0.0);
        let ticks = state.time_ticks;
        assert_eq!(tick(&mut state, &TickInput::default()), GamePhase::GameOver);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_queued_drag_applies_next_tick() {
        let mut state = quiet_state(11);
        let stinger = state.tuning.petal("Stinger").cloned().unwrap();
        state.inventory.merge(stinger).unwrap();
        state.queue_drag(DragIntent {
            from: SlotRef::Loadout(4),
            to: Some(SlotRef::Inventory(1)),
        });
        state.queue_drag(DragIntent {
            from: SlotRef::Inventory(0),
            to: Some(SlotRef::Loadout(4)),
        });
        assert_eq!(state.loadout.petal(4).unwrap().template.name, "Basic");

        tick(&mut state, &TickInput::default());
        assert_eq!(state.loadout.petal(4).unwrap().template.name, "Stinger");
        let basic = state.tuning.petal("Basic").cloned().unwrap();
        assert_eq!(state.inventory.count_of(&basic), 1);
    }

    #[test]
    fn test_idle_mode_runs() {
        let mut state = SimulationState::new(42);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..300 {
            if tick(&mut state, &input) == GamePhase::GameOver {
                break;
            }
        }
        assert!(state.time_ticks > 0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = SimulationState::new(99999);
        let mut state2 = SimulationState::new(99999);

        let inputs = [
            TickInput {
                movement: Vec2::new(1.0, 0.0),
                ..Default::default()
            },
            TickInput {
                fire: true,
                ..Default::default()
            },
            TickInput {
                idle_mode: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..50 {
            for input in &inputs {
                tick(&mut state1, input);
                tick(&mut state2, input);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.mobs.len(), state2.mobs.len());
        for (a, b) in state1.mobs.iter().zip(&state2.mobs) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.pos, b.pos);
        }
        assert_eq!(state1.player.pos, state2.player.pos);
    }

    fn input_strategy() -> impl Strategy<Value = TickInput> {
        (-1.0f32..=1.0, -1.0f32..=1.0, any::<bool>(), any::<bool>()).prop_map(
            |(x, y, fire, recall)| TickInput {
                movement: Vec2::new(x, y),
                fire,
                recall,
                idle_mode: false,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_mobs_stay_on_map(
            seed in any::<u64>(),
            inputs in proptest::collection::vec(input_strategy(), 1..200),
        ) {
            let mut state = SimulationState::new(seed);
            let map = state.tuning.map_size;
            for input in &inputs {
                tick(&mut state, input);
                for mob in &state.mobs {
                    prop_assert!(mob.pos.x >= mob.radius && mob.pos.x <= map.x - mob.radius);
                    prop_assert!(mob.pos.y >= mob.radius && mob.pos.y <= map.y - mob.radius);
                }
                let p = &state.player;
                prop_assert!(p.pos.x >= p.radius && p.pos.x <= map.x - p.radius);
                prop_assert!(p.health >= 0.0 && p.health <= p.max_health);
            }
        }

        #[test]
        fn prop_mob_health_never_recovers(
            seed in any::<u64>(),
            inputs in proptest::collection::vec(input_strategy(), 1..200),
        ) {
            let mut state = SimulationState::new(seed);
            // Crowd mobs around the player so petals actually land hits
            let center = state.player.pos;
            for i in 0..6 {
                let angle = i as f32 * 60.0;
                let pos = center + crate::orbit_offset(70.0, angle);
                state.spawn_mob(0, pos);
            }
            let mut seen: HashMap<u32, f32> = HashMap::new();
            let mut removed: Vec<u32> = Vec::new();
            for input in &inputs {
                tick(&mut state, input);
                let live: HashMap<u32, &Mob> = state.mobs.iter().map(|m| (m.id, m)).collect();
                for id in &removed {
                    prop_assert!(!live.contains_key(id));
                }
                for (id, health) in &seen {
                    match live.get(id) {
                        Some(m) => prop_assert!(m.health <= *health),
                        None => removed.push(*id),
                    }
                }
                seen = live.iter().map(|(id, m)| (*id, m.health)).collect();
                if state.phase == GamePhase::GameOver {
                    break;
                }
            }
        }
    }
}
