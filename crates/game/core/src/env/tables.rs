use std::collections::BTreeMap;

use crate::state::{SkillId, SkillRank};

/// Read-only lookup of per-rank skill parameters.
pub trait RankTableOracle: Send + Sync {
    fn rank_params(&self, skill: SkillId, rank: SkillRank) -> Option<RankParams>;
}

/// Tunables of one skill at one rank.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankParams {
    pub min_damage: u32,
    pub max_damage: u32,
    /// Time in Ready after which a use counts as fully charged.
    pub max_charge_ms: u32,
    pub charge_bonus_percent: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mana_cost: f32,
}

impl RankParams {
    pub const fn new(min_damage: u32, max_damage: u32) -> Self {
        Self {
            min_damage,
            max_damage,
            max_charge_ms: 0,
            charge_bonus_percent: 0,
            mana_cost: 0.0,
        }
    }

    pub const fn with_charge(mut self, max_charge_ms: u32, charge_bonus_percent: u32) -> Self {
        self.max_charge_ms = max_charge_ms;
        self.charge_bonus_percent = charge_bonus_percent;
        self
    }

    pub const fn with_mana_cost(mut self, mana_cost: f32) -> Self {
        self.mana_cost = mana_cost;
        self
    }
}

/// In-memory rank table keyed by skill and rank.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankTable {
    entries: BTreeMap<(SkillId, SkillRank), RankParams>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: SkillId, rank: SkillRank, params: RankParams) {
        self.entries.insert((skill, rank), params);
    }

    pub fn with(mut self, skill: SkillId, rank: SkillRank, params: RankParams) -> Self {
        self.insert(skill, rank, params);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RankTableOracle for RankTable {
    fn rank_params(&self, skill: SkillId, rank: SkillRank) -> Option<RankParams> {
        self.entries.get(&(skill, rank)).copied()
    }
}
