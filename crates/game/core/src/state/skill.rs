//! Skill identity, rank, lifecycle state and training progress.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// Identifier of a skill kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillId(pub u16);

impl SkillId {
    /// Passive melee mastery; target reactions are attributed to it.
    pub const COMBAT_MASTERY: Self = Self(1_001);
    /// Line-shaped lightning attack with a chargeable bonus.
    pub const LIGHTNING_ROD: Self = Self(30_202);
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill:{}", self.0)
    }
}

/// Ordered skill proficiency tier, weakest first.
///
/// Ranks run Novice, F, E, ... A, then 9 down to 1 (the strongest).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum SkillRank {
    #[default]
    #[strum(serialize = "novice")]
    Novice,
    #[strum(serialize = "F")]
    RF,
    #[strum(serialize = "E")]
    RE,
    #[strum(serialize = "D")]
    RD,
    #[strum(serialize = "C")]
    RC,
    #[strum(serialize = "B")]
    RB,
    #[strum(serialize = "A")]
    RA,
    #[strum(serialize = "9")]
    R9,
    #[strum(serialize = "8")]
    R8,
    #[strum(serialize = "7")]
    R7,
    #[strum(serialize = "6")]
    R6,
    #[strum(serialize = "5")]
    R5,
    #[strum(serialize = "4")]
    R4,
    #[strum(serialize = "3")]
    R3,
    #[strum(serialize = "2")]
    R2,
    #[strum(serialize = "1")]
    R1,
}

/// Externally visible lifecycle state of a skill instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SkillState {
    #[default]
    Idle,
    Prepared,
    Ready,
    Active,
    Completed,
    Canceled,
}

impl SkillState {
    /// Completed and Canceled end a cast.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// A new cast may only start when no cast is in flight.
    pub const fn accepts_prepare(self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Canceled)
    }
}

/// Numbered training condition slot on a skill.
///
/// What a slot means is rank dependent; the training table decides which slot
/// an outcome advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingCondition(pub u8);

impl TrainingCondition {
    pub const USE: Self = Self(1);
    pub const HIT_OR_DEFEAT: Self = Self(2);
    pub const FULL_CHARGE: Self = Self(3);
    pub const MULTI_DEFEAT: Self = Self(4);
    pub const MULTI_DEFEAT_FULL_CHARGE: Self = Self(5);

    pub const MAX: u8 = 9;
}

impl fmt::Display for TrainingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "condition {}", self.0)
    }
}

/// Per-condition training counters of one skill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingProgress {
    counts: [u32; TrainingCondition::MAX as usize],
}

impl TrainingProgress {
    /// Count recorded for `condition`; unknown slots read as zero.
    pub fn count(&self, condition: TrainingCondition) -> u32 {
        Self::slot(condition)
            .map(|index| self.counts[index])
            .unwrap_or(0)
    }

    /// Sum over all slots.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    fn record(&mut self, condition: TrainingCondition) -> Option<u32> {
        let index = Self::slot(condition)?;
        self.counts[index] = self.counts[index].saturating_add(1);
        Some(self.counts[index])
    }

    fn slot(condition: TrainingCondition) -> Option<usize> {
        match condition.0 {
            1..=TrainingCondition::MAX => Some(usize::from(condition.0 - 1)),
            _ => None,
        }
    }
}

/// A learned skill owned by one combatant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillInstance {
    pub id: SkillId,
    pub rank: SkillRank,
    state: SkillState,
    training: TrainingProgress,
}

impl SkillInstance {
    pub fn new(id: SkillId, rank: SkillRank) -> Self {
        Self {
            id,
            rank,
            state: SkillState::Idle,
            training: TrainingProgress::default(),
        }
    }

    pub fn state(&self) -> SkillState {
        self.state
    }

    pub fn training(&self) -> &TrainingProgress {
        &self.training
    }

    /// Advances one training condition. Returns the new count, or `None` when
    /// the condition slot does not exist.
    pub fn train(&mut self, condition: TrainingCondition) -> Option<u32> {
        self.training.record(condition)
    }

    /// Only the lifecycle state machine moves a skill between states.
    pub(crate) fn set_state(&mut self, state: SkillState) {
        self.state = state;
    }
}

/// Skills learned by a combatant, keyed by kind.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillSet {
    skills: BTreeMap<SkillId, SkillInstance>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a skill at the given rank, replacing any previous instance.
    pub fn learn(&mut self, id: SkillId, rank: SkillRank) -> &mut SkillInstance {
        let instance = SkillInstance::new(id, rank);
        match self.skills.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(instance);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(instance),
        }
    }

    pub fn with_skill(mut self, id: SkillId, rank: SkillRank) -> Self {
        self.learn(id, rank);
        self
    }

    pub fn get(&self, id: SkillId) -> Option<&SkillInstance> {
        self.skills.get(&id)
    }

    pub fn get_mut(&mut self, id: SkillId) -> Option<&mut SkillInstance> {
        self.skills.get_mut(&id)
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.skills.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillInstance> {
        self.skills.values()
    }
}
