//! Data describing one skill kind.

use crate::combat::AttackerOptions;
use crate::state::{Locks, SkillId, TARGET_MARKER_PROP};
use crate::training::TrainingTable;

/// Oriented rectangle placed ahead of the caster.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionShape {
    /// Distance from the caster to the rectangle's center.
    pub forward_offset: f64,
    /// Extent along the caster's facing.
    pub length: f64,
    pub width: f64,
}

/// Prop spawned at the target area on use and removed after `lifetime_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerProp {
    pub class: u32,
    pub lifetime_ms: u64,
}

/// Everything the lifecycle engine needs to run a skill.
///
/// Per-rank numbers (damage, charge, mana) come from the rank table oracle,
/// not from here.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDescriptor {
    pub id: SkillId,
    pub name: String,
    pub shape: RegionShape,
    pub base_stun_ms: u32,
    pub knockback_distance: f64,
    pub effect_id: u32,
    /// Locks held from prepare until the cast ends.
    pub cast_locks: Locks,
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_right_hand: bool,
    /// Finish the cast right after use instead of waiting for a complete
    /// request.
    #[cfg_attr(feature = "serde", serde(default = "default_auto_complete"))]
    pub auto_complete: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attacker_options: AttackerOptions,
    /// Skill that target reactions are attributed to.
    pub reaction_skill: SkillId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub marker: Option<MarkerProp>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub training: TrainingTable,
}

#[cfg(feature = "serde")]
fn default_auto_complete() -> bool {
    true
}

impl SkillDescriptor {
    pub const LIGHTNING_ROD_EFFECT: u32 = 22;

    /// Built-in Lightning Rod: a 1400×200 line starting in front of the
    /// caster, 2 s stun and a 720 unit knockback.
    pub fn lightning_rod() -> Self {
        Self {
            id: SkillId::LIGHTNING_ROD,
            name: "Lightning Rod".to_owned(),
            shape: RegionShape {
                forward_offset: 800.0,
                length: 1_400.0,
                width: 200.0,
            },
            base_stun_ms: 2_000,
            knockback_distance: 720.0,
            effect_id: Self::LIGHTNING_ROD_EFFECT,
            cast_locks: Locks::MOVEMENT,
            requires_right_hand: true,
            auto_complete: true,
            attacker_options: AttackerOptions::KNOCKBACK_HIT | AttackerOptions::USE_EFFECT,
            reaction_skill: SkillId::COMBAT_MASTERY,
            marker: Some(MarkerProp {
                class: TARGET_MARKER_PROP,
                lifetime_ms: 5_000,
            }),
            training: TrainingTable::lightning_rod(),
        }
    }
}
