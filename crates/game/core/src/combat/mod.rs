//! Hit resolution and the packs that broadcast it.
//!
//! - [`damage`]: the ordered mitigation pipeline for one attacker/target pair
//! - [`action`]: attacker and target actions with their option flags
//! - [`pack`]: the all-or-nothing unit published once per skill use

pub mod action;
pub mod damage;
pub mod pack;

pub use action::{
    AttackerAction, AttackerActionKind, AttackerOptions, CombatAction, LocationId, TargetAction,
    TargetActionKind, TargetOptions,
};
pub use damage::{
    DamageError, DamageOutcome, DamagePipeline, HitRolls, HitSpec, KnockbackDecision,
    absorb_with_shield, apply_charge_bonus, apply_critical, apply_mitigation, decide_knockback,
    deflect, reduce_stun,
};
pub use pack::{CombatActionPack, PackError};
