use crate::state::{EntityId, SkillId};

/// A caster's skill hit one target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetAttacked {
    pub caster: EntityId,
    pub target: EntityId,
    pub skill: SkillId,
    pub target_died: bool,
    pub full_charge: bool,
    /// Targets of the same pack that died, this one included.
    pub defeated_in_pack: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefeatRecord {
    pub target: EntityId,
    pub died: bool,
}

/// A caster finished one skill use; carries every target of the pack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CasterAttacked {
    pub caster: EntityId,
    pub skill: SkillId,
    pub targets: Vec<DefeatRecord>,
    pub full_charge: bool,
}

impl CasterAttacked {
    /// Targets that died to this pack.
    pub fn defeated(&self) -> usize {
        self.targets.iter().filter(|t| t.died).count()
    }
}

/// Combat outcome consumed by training observers. Never mutated after
/// emission.
#[derive(Clone, Debug, PartialEq, Eq, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ProgressionEvent {
    TargetAttacked(TargetAttacked),
    CasterAttacked(CasterAttacked),
}

impl ProgressionEvent {
    pub fn caster(&self) -> EntityId {
        match self {
            Self::TargetAttacked(e) => e.caster,
            Self::CasterAttacked(e) => e.caster,
        }
    }

    pub fn skill(&self) -> SkillId {
        match self {
            Self::TargetAttacked(e) => e.skill,
            Self::CasterAttacked(e) => e.skill,
        }
    }
}
