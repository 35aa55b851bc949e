//! Authoritative per-region entity store.

use std::collections::BTreeMap;

use crate::geometry::Facing;

use super::combatant::Combatant;
use super::common::{EntityId, Position, PropId, RegionId};
use super::error::RegionError;
use super::locks::Locks;

/// Prop class of the marker placed at a skill's target area.
pub const TARGET_MARKER_PROP: u32 = 280;

/// Transient world object (markers, effect anchors).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prop {
    pub id: PropId,
    pub class: u32,
    pub position: Position,
    pub facing: Facing,
}

/// Every combatant and prop of one region.
///
/// A region is mutated by exactly one worker; casts touching the same targets
/// within a tick are therefore serialized.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub id: RegionId,
    combatants: BTreeMap<EntityId, Combatant>,
    props: BTreeMap<PropId, Prop>,
    next_prop: u64,
}

impl Region {
    pub fn new(id: RegionId) -> Self {
        Self {
            id,
            combatants: BTreeMap::new(),
            props: BTreeMap::new(),
            next_prop: 1,
        }
    }

    /// Adds a combatant. Its region tag is overwritten with this region.
    pub fn spawn(&mut self, mut combatant: Combatant) -> Result<EntityId, RegionError> {
        let id = combatant.id;
        if self.combatants.contains_key(&id) {
            return Err(RegionError::DuplicateEntity(id));
        }
        combatant.region = self.id;
        self.combatants.insert(id, combatant);
        Ok(id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Places a prop and returns its fresh id.
    pub fn add_prop(&mut self, class: u32, position: Position, facing: Facing) -> PropId {
        let id = PropId(self.next_prop);
        self.next_prop += 1;
        self.props.insert(
            id,
            Prop {
                id,
                class,
                position,
                facing,
            },
        );
        id
    }

    pub fn remove_prop(&mut self, id: PropId) -> Option<Prop> {
        self.props.remove(&id)
    }

    pub fn prop(&self, id: PropId) -> Option<&Prop> {
        self.props.get(&id)
    }

    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.values()
    }
}

/// Entity-scoped lock bookkeeping.
///
/// Every acquire takes one share per bit and every release gives one back, so
/// a bit stays held until each holder has released it. Both report the bits
/// they affected so callers can detect a double release.
pub trait LockManager {
    fn acquire(&mut self, entity: EntityId, locks: Locks) -> Result<Locks, RegionError>;
    fn release(&mut self, entity: EntityId, locks: Locks) -> Result<Locks, RegionError>;
}

impl LockManager for Region {
    fn acquire(&mut self, entity: EntityId, locks: Locks) -> Result<Locks, RegionError> {
        let combatant = self
            .get_mut(entity)
            .ok_or(RegionError::EntityNotFound(entity))?;
        Ok(combatant.hold_locks(locks))
    }

    fn release(&mut self, entity: EntityId, locks: Locks) -> Result<Locks, RegionError> {
        let combatant = self
            .get_mut(entity)
            .ok_or(RegionError::EntityNotFound(entity))?;
        Ok(combatant.drop_locks(locks))
    }
}
