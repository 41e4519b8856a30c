//! Data-driven game balance
//!
//! Every number the simulation reads lives here. A tuning file is JSON; any
//! field it leaves out keeps its default, so a minimal file can override just
//! the values being tuned.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{MobArchetype, PetalTemplate, Rarity};

/// Failure to load or validate a tuning file
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// A mob kind as written in the tuning file; drops name petals in the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub name: String,
    pub radius: f32,
    pub health: f32,
    pub speed: f32,
    pub damage: f32,
    pub spawn_point: Vec2,
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f64,
    #[serde(default)]
    pub drops: Vec<String>,
}

fn default_spawn_chance() -> f64 {
    SPAWN_CHANCE
}

/// Game balance values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// RNG seed for the run
    pub seed: u64,
    pub map_size: Vec2,

    // === Player ===
    pub player_radius: f32,
    /// Distance per frame per axis
    pub player_speed: f32,
    pub player_max_health: f32,
    pub knockback_frames: u32,
    pub knockback_speed: f32,

    // === Petal ring ===
    pub orbit_radius: f32,
    pub orbit_radius_extended: f32,
    /// Degrees per frame
    pub rotation_speed: f32,
    pub loadout_size: usize,
    /// Petal names equipped at the start of a run, slot by slot
    pub starting_loadout: Vec<String>,

    // === Drops & inventory ===
    pub drop_ttl: i32,
    pub drop_jitter: f32,
    pub inventory_rows: usize,
    pub inventory_cols: usize,

    // === Mobs ===
    pub mob_cap: usize,
    pub initial_mobs: usize,
    pub archetypes: Vec<ArchetypeConfig>,

    /// Every petal kind that can exist in a run
    pub petals: Vec<PetalTemplate>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            map_size: Vec2::splat(MAP_SIZE),

            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            player_max_health: PLAYER_MAX_HEALTH,
            knockback_frames: KNOCKBACK_FRAMES,
            knockback_speed: KNOCKBACK_SPEED,

            orbit_radius: ORBIT_RADIUS,
            orbit_radius_extended: ORBIT_RADIUS_EXTENDED,
            rotation_speed: ROTATION_SPEED,
            loadout_size: PETAL_COUNT,
            starting_loadout: vec!["Basic".to_string(); PETAL_COUNT],

            drop_ttl: DROP_TTL,
            drop_jitter: DROP_JITTER,
            inventory_rows: INVENTORY_ROWS,
            inventory_cols: INVENTORY_COLS,

            mob_cap: MOB_CAP,
            initial_mobs: INITIAL_MOBS,
            archetypes: vec![ArchetypeConfig {
                name: "Bee".to_string(),
                radius: 40.0,
                health: 37.0,
                speed: 5.0,
                damage: 50.0,
                spawn_point: Vec2::new(500.0, 500.0),
                spawn_chance: SPAWN_CHANCE,
                drops: vec![
                    "Pollen".to_string(),
                    "Stinger".to_string(),
                    "Missile".to_string(),
                ],
            }],

            petals: default_petals(),
        }
    }
}

fn default_petals() -> Vec<PetalTemplate> {
    vec![
        PetalTemplate::new("Basic", Rarity::Common, 75, 10.0),
        PetalTemplate {
            color: [255, 216, 0],
            shootable: true,
            decelerating: true,
            return_duration: 150,
            ..PetalTemplate::new("Pollen", Rarity::Unusual, 30, 19.0)
        },
        PetalTemplate {
            color: [0, 0, 0],
            ..PetalTemplate::new("Stinger", Rarity::Rare, 300, 100.0)
        },
        PetalTemplate {
            color: [64, 64, 64],
            shootable: true,
            ..PetalTemplate::new("Missile", Rarity::Unusual, 45, 75.0)
        },
    ]
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Read a tuning file, falling back to defaults when it is missing or bad
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("{e}; using default tuning");
                Self::default()
            }
            None => {
                log::info!("Using default tuning");
                Self::default()
            }
        }
    }

    pub fn inventory_size(&self) -> usize {
        self.inventory_rows * self.inventory_cols
    }

    /// Catalogue lookup by name
    pub fn petal(&self, name: &str) -> Option<&PetalTemplate> {
        self.petals.iter().find(|p| p.name == name)
    }

    fn resolve(&self, name: &str, context: &str) -> Result<PetalTemplate, TuningError> {
        self.petal(name)
            .cloned()
            .ok_or_else(|| TuningError::Invalid(format!("{context} names unknown petal '{name}'")))
    }

    /// Templates for the starting loadout, in slot order
    pub fn starting_petals(&self) -> Result<Vec<PetalTemplate>, TuningError> {
        self.starting_loadout
            .iter()
            .map(|name| self.resolve(name, "starting loadout"))
            .collect()
    }

    /// Spawn archetypes with their drop tables resolved against the catalogue
    pub fn mob_archetypes(&self) -> Result<Vec<MobArchetype>, TuningError> {
        self.archetypes
            .iter()
            .map(|a| {
                let drop_table = a
                    .drops
                    .iter()
                    .map(|name| self.resolve(name, &format!("archetype '{}'", a.name)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MobArchetype {
                    name: a.name.clone(),
                    radius: a.radius,
                    health: a.health,
                    speed: a.speed,
                    damage: a.damage,
                    spawn_point: a.spawn_point,
                    spawn_chance: a.spawn_chance,
                    drop_table,
                })
            })
            .collect()
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: String| Err(TuningError::Invalid(msg));

        let largest_body = self
            .archetypes
            .iter()
            .map(|a| a.radius)
            .fold(self.player_radius, f32::max);
        if self.map_size.min_element() <= 2.0 * largest_body {
            return invalid(format!(
                "map {}x{} too small for bodies of radius {largest_body}",
                self.map_size.x, self.map_size.y
            ));
        }
        if self.player_max_health <= 0.0 {
            return invalid("player_max_health must be positive".to_string());
        }
        if self.mob_cap == 0 {
            return invalid("mob_cap must be at least 1".to_string());
        }
        if self.loadout_size == 0 {
            return invalid("loadout_size must be at least 1".to_string());
        }
        if self.starting_loadout.len() > self.loadout_size {
            return invalid(format!(
                "starting loadout has {} petals for {} slots",
                self.starting_loadout.len(),
                self.loadout_size
            ));
        }
        if let Some(a) = self
            .archetypes
            .iter()
            .find(|a| !(0.0..=1.0).contains(&a.spawn_chance))
        {
            return invalid(format!("archetype '{}' spawn_chance outside 0..=1", a.name));
        }
        if !(self.drop_jitter.is_finite() && self.drop_jitter >= 0.0) {
            return invalid(format!("drop_jitter {} must be finite and >= 0", self.drop_jitter));
        }
        if let Some(a) = self
            .archetypes
            .iter()
            .find(|a| !(a.radius.is_finite() && a.radius > 0.0 && a.speed.is_finite() && a.speed >= 0.0))
        {
            return invalid(format!("archetype '{}' needs positive radius and speed", a.name));
        }
        self.starting_petals()?;
        self.mob_archetypes()?;
        Ok(())
    }
}
