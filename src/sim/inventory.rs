//! Inventory stacks, the equipped loadout, and drag-and-drop between them
//!
//! An item being dragged is always detached from its source before it is
//! offered to a destination, and goes back to its origin if nothing accepts it.

use serde::{Deserialize, Serialize};

use super::petal::{Petal, PetalTemplate};

/// One inventory cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum InventorySlot {
    #[default]
    Empty,
    Occupied { template: PetalTemplate, count: u32 },
}

impl InventorySlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, InventorySlot::Empty)
    }

    fn holds(&self, template: &PetalTemplate) -> bool {
        match self {
            InventorySlot::Occupied { template: t, .. } => t.same_kind(template),
            InventorySlot::Empty => false,
        }
    }

    /// Add one item if this slot is empty or already stacks the same kind
    fn accept(&mut self, template: PetalTemplate) -> Result<(), PetalTemplate> {
        match self {
            InventorySlot::Empty => {
                *self = InventorySlot::Occupied { template, count: 1 };
                Ok(())
            }
            InventorySlot::Occupied { template: t, count } if t.same_kind(&template) => {
                *count += 1;
                Ok(())
            }
            InventorySlot::Occupied { .. } => Err(template),
        }
    }
}

/// Fixed-size grid of petal stacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![InventorySlot::Empty; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&InventorySlot> {
        self.slots.get(index)
    }

    /// Total items of this kind across all slots
    pub fn count_of(&self, template: &PetalTemplate) -> u32 {
        self.slots
            .iter()
            .map(|s| match s {
                InventorySlot::Occupied { template: t, count } if t.same_kind(template) => *count,
                _ => 0,
            })
            .sum()
    }

    /// Stack an item: onto an existing matching stack if there is one, else into
    /// the first empty slot. Returns the slot used, or the item back when full.
    pub fn merge(&mut self, template: PetalTemplate) -> Result<usize, PetalTemplate> {
        let index = self
            .slots
            .iter()
            .position(|s| s.holds(&template))
            .or_else(|| self.slots.iter().position(InventorySlot::is_empty));
        match index {
            Some(i) => self.slots[i].accept(template).map(|()| i),
            None => Err(template),
        }
    }

    /// Manual placement into a specific slot (same stacking rule as `merge`)
    pub fn place(&mut self, index: usize, template: PetalTemplate) -> Result<(), PetalTemplate> {
        match self.slots.get_mut(index) {
            Some(slot) => slot.accept(template),
            None => Err(template),
        }
    }

    /// Take a single item off the stack at `index`
    pub fn take_one(&mut self, index: usize) -> Option<PetalTemplate> {
        let slot = self.slots.get_mut(index)?;
        if let InventorySlot::Occupied { template, count } = &mut *slot {
            if *count > 1 {
                *count -= 1;
                return Some(template.clone());
            }
        }
        match std::mem::take(slot) {
            InventorySlot::Occupied { template, .. } => Some(template),
            InventorySlot::Empty => None,
        }
    }
}

/// One equipped ring position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum LoadoutSlot {
    #[default]
    Empty,
    Occupied(Petal),
}

/// The equipped petals; the only petals the simulation advances and collides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadout {
    slots: Vec<LoadoutSlot>,
}

impl Loadout {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![LoadoutSlot::Empty; size],
        }
    }

    /// Loadout with each template equipped in order, evenly spaced on the ring
    pub fn with_petals(size: usize, templates: &[PetalTemplate]) -> Self {
        let mut loadout = Self::new(size);
        for (slot, template) in templates.iter().take(size).enumerate() {
            let angle = Petal::slot_angle(slot, size, 0.0);
            loadout.slots[slot] = LoadoutSlot::Occupied(Petal::new(template.clone(), angle, slot));
        }
        loadout
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[LoadoutSlot] {
        &self.slots
    }

    pub fn petal(&self, slot: usize) -> Option<&Petal> {
        match self.slots.get(slot)? {
            LoadoutSlot::Occupied(p) => Some(p),
            LoadoutSlot::Empty => None,
        }
    }

    pub fn petals(&self) -> impl Iterator<Item = &Petal> {
        self.slots.iter().filter_map(|s| match s {
            LoadoutSlot::Occupied(p) => Some(p),
            LoadoutSlot::Empty => None,
        })
    }

    pub fn petals_mut(&mut self) -> impl Iterator<Item = &mut Petal> {
        self.slots.iter_mut().filter_map(|s| match s {
            LoadoutSlot::Occupied(p) => Some(p),
            LoadoutSlot::Empty => None,
        })
    }

    /// Detach the live petal from a slot
    pub fn take(&mut self, slot: usize) -> Option<Petal> {
        match std::mem::take(self.slots.get_mut(slot)?) {
            LoadoutSlot::Occupied(p) => Some(p),
            LoadoutSlot::Empty => None,
        }
    }

    /// Equip a fresh petal built from `template` into an empty slot
    pub fn place(
        &mut self,
        slot: usize,
        template: PetalTemplate,
        ring_offset: f32,
    ) -> Result<(), PetalTemplate> {
        let size = self.slots.len();
        match self.slots.get_mut(slot) {
            Some(s) if matches!(s, LoadoutSlot::Empty) => {
                let angle = Petal::slot_angle(slot, size, ring_offset);
                *s = LoadoutSlot::Occupied(Petal::new(template, angle, slot));
                Ok(())
            }
            _ => Err(template),
        }
    }

    /// Put a detached petal back exactly as it was
    fn restore(&mut self, petal: Petal) -> Result<(), Petal> {
        match self.slots.get_mut(petal.slot) {
            Some(s) if matches!(s, LoadoutSlot::Empty) => {
                *s = LoadoutSlot::Occupied(petal);
                Ok(())
            }
            _ => Err(petal),
        }
    }
}

/// Address of a slot in either container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotRef {
    Inventory(usize),
    Loadout(usize),
}

/// A drag gesture from the UI: pick up at `from`, release over `to`
/// (`None` when released over nothing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragIntent {
    pub from: SlotRef,
    pub to: Option<SlotRef>,
}

/// What happened to a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Source slot was empty
    Ignored,
    /// Item landed in the destination
    Moved,
    /// Destination refused; item is back where it started
    Returned,
}

/// Item in hand during a drag
enum Held {
    Stack(PetalTemplate),
    Live(Petal),
}

impl Held {
    fn into_template(self) -> PetalTemplate {
        match self {
            Held::Stack(t) => t,
            Held::Live(p) => p.template,
        }
    }
}

/// Apply one drag gesture atomically
pub fn apply_drag(
    inventory: &mut Inventory,
    loadout: &mut Loadout,
    intent: DragIntent,
    ring_offset: f32,
) -> DragOutcome {
    let held = match intent.from {
        SlotRef::Inventory(i) => inventory.take_one(i).map(Held::Stack),
        SlotRef::Loadout(i) => loadout.take(i).map(Held::Live),
    };
    let Some(held) = held else {
        return DragOutcome::Ignored;
    };

    let held = match intent.to {
        Some(to) if to != intent.from => {
            let template = match &held {
                Held::Stack(t) => t.clone(),
                Held::Live(p) => p.template.clone(),
            };
            let placed = match to {
                SlotRef::Inventory(i) => inventory.place(i, template),
                SlotRef::Loadout(i) => loadout.place(i, template, ring_offset),
            };
            if placed.is_ok() {
                return DragOutcome::Moved;
            }
            held
        }
        _ => held,
    };

    let restored = match (intent.from, held) {
        (SlotRef::Inventory(i), held) => inventory.place(i, held.into_template()),
        (SlotRef::Loadout(_), Held::Live(petal)) => {
            loadout.restore(petal).map_err(|p| p.template)
        }
        (SlotRef::Loadout(i), held) => loadout.place(i, held.into_template(), ring_offset),
    };
    if let Err(template) = restored {
        // The origin was emptied by this same call, so this only triggers if
        // the addresses are inconsistent; keep the item rather than lose it.
        if let Err(template) = inventory.merge(template) {
            log::warn!("drag of {} could not be returned; item discarded", template.name);
        }
    }
    DragOutcome::Returned
}
