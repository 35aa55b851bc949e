//! Combatant state: placement, resources, locks and mitigation profile.

use crate::geometry::Facing;

use super::common::{EntityId, Position, RegionId, ResourceMeter};
use super::locks::{LockHolds, Locks};
use super::skill::SkillSet;

/// Faction tag used by the default hostility rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Faction(pub u16);

impl Faction {
    pub const PLAYERS: Self = Self(0);
    pub const MONSTERS: Self = Self(1);

    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

/// Whether forced knockdown can be applied to a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stance {
    #[default]
    KnockDownable,
    /// Large or rooted creatures that take hits without being moved.
    Immovable,
}

/// Identifier of an equipped item (item data itself lives elsewhere).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    pub right_hand: Option<ItemId>,
}

/// Damage-absorbing barrier with its own depletable pool.
///
/// `efficiency` is how many points of damage one point of pool absorbs.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShieldState {
    pub active: bool,
    pub pool: f32,
    pub efficiency: f32,
}

impl ShieldState {
    pub fn new(pool: f32, efficiency: f32) -> Self {
        Self {
            active: true,
            pool: pool.max(0.0),
            efficiency: efficiency.max(f32::EPSILON),
        }
    }
}

/// Field that weakens incoming hits and shortens the resulting stun.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeflectorState {
    pub active: bool,
    /// Fraction of damage removed, in percent.
    pub damage_reduction_percent: f32,
    /// Stun shortening handed back to the caller, in percent.
    pub delay_reduction_percent: u8,
}

impl DeflectorState {
    pub fn new(damage_reduction_percent: f32, delay_reduction_percent: u8) -> Self {
        Self {
            active: true,
            damage_reduction_percent: damage_reduction_percent.clamp(0.0, 100.0),
            delay_reduction_percent: delay_reduction_percent.min(100),
        }
    }
}

/// Mitigation profile of a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseProfile {
    /// Flat reduction subtracted from every hit.
    pub defense: f32,
    /// Percent reduction applied after the flat reduction; also lowers the
    /// attacker's critical chance.
    pub protection: f32,
    pub shield: Option<ShieldState>,
    pub deflector: Option<DeflectorState>,
}

impl DefenseProfile {
    pub fn new(defense: f32, protection: f32) -> Self {
        Self {
            defense: defense.max(0.0),
            protection: protection.clamp(0.0, 100.0),
            shield: None,
            deflector: None,
        }
    }

    pub fn with_shield(mut self, shield: ShieldState) -> Self {
        self.shield = Some(shield);
        self
    }

    pub fn with_deflector(mut self, deflector: DeflectorState) -> Self {
        self.deflector = Some(deflector);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffenseProfile {
    /// Critical chance in percent before the target's protection is applied.
    pub critical_chance: f32,
}

/// A creature or player that can cast and be hit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: EntityId,
    pub region: RegionId,
    pub position: Position,
    pub facing: Facing,
    /// Where the combatant is walking to, if anywhere.
    pub destination: Option<Position>,
    pub faction: Faction,
    pub stance: Stance,
    pub health: ResourceMeter,
    pub mana: ResourceMeter,
    pub offense: OffenseProfile,
    pub defense: DefenseProfile,
    pub equipment: Equipment,
    pub skills: SkillSet,
    /// Remaining stun applied by the last hit, in milliseconds.
    pub stun_ms: u32,
    locks: LockHolds,
}

impl Combatant {
    pub fn new(id: EntityId, region: RegionId, position: Position, health: f32) -> Self {
        Self {
            id,
            region,
            position,
            facing: Facing::default(),
            destination: None,
            faction: Faction::default(),
            stance: Stance::default(),
            health: ResourceMeter::full(health),
            mana: ResourceMeter::default(),
            offense: OffenseProfile::default(),
            defense: DefenseProfile::default(),
            equipment: Equipment::default(),
            skills: SkillSet::new(),
            stun_ms: 0,
            locks: LockHolds::default(),
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    pub fn with_mana(mut self, mana: f32) -> Self {
        self.mana = ResourceMeter::full(mana);
        self
    }

    pub fn with_defense(mut self, defense: DefenseProfile) -> Self {
        self.defense = defense;
        self
    }

    pub fn with_critical_chance(mut self, percent: f32) -> Self {
        self.offense.critical_chance = percent.max(0.0);
        self
    }

    pub fn with_right_hand(mut self, item: ItemId) -> Self {
        self.equipment.right_hand = Some(item);
        self
    }

    pub fn with_skills(mut self, skills: SkillSet) -> Self {
        self.skills = skills;
        self
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_empty()
    }

    pub fn locks(&self) -> Locks {
        self.locks.locks()
    }

    pub fn lock_holds(&self) -> &LockHolds {
        &self.locks
    }

    /// Halts locomotion by dropping the current destination.
    pub fn stop_move(&mut self) {
        self.destination = None;
    }

    /// Takes one share of `locks`; returns the bits the holder now owes.
    pub(crate) fn hold_locks(&mut self, locks: Locks) -> Locks {
        self.locks.hold(locks)
    }

    /// Gives back one share of `locks`; returns the bits that had a share.
    pub(crate) fn drop_locks(&mut self, locks: Locks) -> Locks {
        self.locks.release(locks)
    }
}
