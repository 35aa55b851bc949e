//! Authoritative combat state.
//!
//! A [`Region`] owns every combatant and prop of one world region. Skill casts
//! and hit resolution mutate it only through the engine running inside the
//! region's worker.
mod combatant;
mod common;
mod error;
mod locks;
mod region;
mod skill;

pub use combatant::{
    Combatant, DefenseProfile, DeflectorState, Equipment, Faction, ItemId, OffenseProfile,
    ShieldState, Stance,
};
pub use common::{EntityId, Millis, Position, PropId, RegionId, ResourceMeter};
pub use error::RegionError;
pub use locks::{LockHolds, Locks};
pub use region::{LockManager, Prop, Region, TARGET_MARKER_PROP};
pub use skill::{
    SkillId, SkillInstance, SkillRank, SkillSet, SkillState, TrainingCondition, TrainingProgress,
};
