//! Entity registry
//!
//! Arena of generation-checked slots. Entities append on create, keep a stable
//! update/draw order, and are only ever removed by the per-tick compaction
//! sweep - ids held across a compaction simply stop resolving.

use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Stable handle to a registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    slots: Vec<Slot>,
    /// Live ids in insertion order
    order: Vec<EntityId>,
    free: Vec<u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, reusing a freed slot when one is available
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, entity: Some(entity) });
                EntityId { index, generation: 0 }
            }
        };
        self.order.push(id);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Snapshot of live ids in stable order; safe to hold while spawning
    pub fn ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.order.iter().filter_map(|&id| self.get(id).map(|e| (id, e)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove every entity flagged for deletion. Returns the removed count.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.order.retain(|id| {
            let slot = &mut slots[id.index as usize];
            let doomed = slot
                .entity
                .as_ref()
                .map(|e| e.doomed)
                .unwrap_or(true);
            if doomed {
                slot.entity = None;
                slot.generation += 1;
                free.push(id.index);
                removed += 1;
            }
            !doomed
        });
        removed
    }
}
