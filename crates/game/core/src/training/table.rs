//! Rank-tiered training predicates.

use crate::state::{SkillRank, TrainingCondition};

use super::event::ProgressionEvent;

/// One predicate and the condition slot it advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrainingRule {
    /// Any target hit.
    Hit { condition: TrainingCondition },
    HitWithFullCharge { condition: TrainingCondition },
    /// The hit killed its target.
    Defeat { condition: TrainingCondition },
    DefeatWithFullCharge { condition: TrainingCondition },
    /// At least `min` targets of one pack died.
    MultiDefeat {
        min: u32,
        require_full_charge: bool,
        condition: TrainingCondition,
    },
}

impl TrainingRule {
    /// The condition to advance if `event` satisfies this rule.
    pub fn check(&self, event: &ProgressionEvent) -> Option<TrainingCondition> {
        let satisfied = match (self, event) {
            (Self::Hit { .. }, ProgressionEvent::TargetAttacked(_)) => true,
            (Self::HitWithFullCharge { .. }, ProgressionEvent::TargetAttacked(e)) => e.full_charge,
            (Self::Defeat { .. }, ProgressionEvent::TargetAttacked(e)) => e.target_died,
            (Self::DefeatWithFullCharge { .. }, ProgressionEvent::TargetAttacked(e)) => {
                e.target_died && e.full_charge
            }
            (
                Self::MultiDefeat {
                    min,
                    require_full_charge,
                    ..
                },
                ProgressionEvent::CasterAttacked(e),
            ) => e.defeated() >= *min as usize && (!require_full_charge || e.full_charge),
            _ => false,
        };
        satisfied.then_some(self.condition())
    }

    pub fn condition(&self) -> TrainingCondition {
        match *self {
            Self::Hit { condition }
            | Self::HitWithFullCharge { condition }
            | Self::Defeat { condition }
            | Self::DefeatWithFullCharge { condition }
            | Self::MultiDefeat { condition, .. } => condition,
        }
    }
}

/// Rules shared by a contiguous rank range.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingTier {
    pub from: SkillRank,
    pub to: SkillRank,
    pub rules: Vec<TrainingRule>,
}

impl TrainingTier {
    pub fn new(from: SkillRank, to: SkillRank, rules: impl Into<Vec<TrainingRule>>) -> Self {
        Self {
            from,
            to,
            rules: rules.into(),
        }
    }

    pub fn covers(&self, rank: SkillRank) -> bool {
        self.from <= rank && rank <= self.to
    }
}

/// Rank → predicate lookup of one skill.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TrainingTable {
    tiers: Vec<TrainingTier>,
}

impl TrainingTable {
    pub fn new(tiers: Vec<TrainingTier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[TrainingTier] {
        &self.tiers
    }

    /// Every condition `event` advances at `rank`, in rule order. Rules are
    /// independent; several may fire for one event.
    pub fn evaluate(&self, rank: SkillRank, event: &ProgressionEvent) -> Vec<TrainingCondition> {
        self.tiers
            .iter()
            .filter(|tier| tier.covers(rank))
            .flat_map(|tier| tier.rules.iter())
            .filter_map(|rule| rule.check(event))
            .collect()
    }

    /// Shipped table of the Lightning Rod.
    pub fn lightning_rod() -> Self {
        use SkillRank::*;
        use TrainingRule::*;

        const HIT: TrainingCondition = TrainingCondition::HIT_OR_DEFEAT;
        const CHARGED: TrainingCondition = TrainingCondition::FULL_CHARGE;
        const MULTI: TrainingCondition = TrainingCondition::MULTI_DEFEAT;
        const MULTI_CHARGED: TrainingCondition = TrainingCondition::MULTI_DEFEAT_FULL_CHARGE;

        let multi = |min, with_charge: bool| {
            let mut rules = vec![MultiDefeat {
                min,
                require_full_charge: false,
                condition: MULTI,
            }];
            if with_charge {
                rules.push(MultiDefeat {
                    min,
                    require_full_charge: true,
                    condition: MULTI_CHARGED,
                });
            }
            rules
        };

        Self::new(vec![
            TrainingTier::new(RF, RE, [Hit { condition: HIT }]),
            TrainingTier::new(
                RD,
                RC,
                [
                    Hit { condition: HIT },
                    HitWithFullCharge { condition: CHARGED },
                ],
            ),
            TrainingTier::new(
                RB,
                R1,
                [
                    Defeat { condition: HIT },
                    DefeatWithFullCharge { condition: CHARGED },
                ],
            ),
            TrainingTier::new(R9, R7, multi(2, false)),
            TrainingTier::new(R6, R4, multi(3, false)),
            TrainingTier::new(R3, R2, multi(4, true)),
            TrainingTier::new(R1, R1, multi(5, true)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntityId, SkillId};
    use crate::training::{CasterAttacked, DefeatRecord, TargetAttacked};

    fn pack_event(kills: usize, total: usize, full_charge: bool) -> ProgressionEvent {
        ProgressionEvent::CasterAttacked(CasterAttacked {
            caster: EntityId(1),
            skill: SkillId::LIGHTNING_ROD,
            targets: (0..total)
                .map(|i| DefeatRecord {
                    target: EntityId(10 + i as u64),
                    died: i < kills,
                })
                .collect(),
            full_charge,
        })
    }

    fn hit_event(target_died: bool, full_charge: bool) -> ProgressionEvent {
        ProgressionEvent::TargetAttacked(TargetAttacked {
            caster: EntityId(1),
            target: EntityId(2),
            skill: SkillId::LIGHTNING_ROD,
            target_died,
            full_charge,
            defeated_in_pack: usize::from(target_died),
        })
    }

    #[test]
    fn mid_tier_multi_defeat_needs_two_kills() {
        let table = TrainingTable::lightning_rod();
        assert_eq!(
            table.evaluate(SkillRank::R7, &pack_event(2, 3, false)),
            vec![TrainingCondition::MULTI_DEFEAT]
        );
        assert!(table.evaluate(SkillRank::R7, &pack_event(1, 3, false)).is_empty());
    }

    #[test]
    fn charged_hits_fire_both_rules() {
        let table = TrainingTable::lightning_rod();
        assert_eq!(
            table.evaluate(SkillRank::RD, &hit_event(false, true)),
            vec![
                TrainingCondition::HIT_OR_DEFEAT,
                TrainingCondition::FULL_CHARGE
            ]
        );
        assert_eq!(
            table.evaluate(SkillRank::RF, &hit_event(false, true)),
            vec![TrainingCondition::HIT_OR_DEFEAT]
        );
    }

    #[test]
    fn high_ranks_train_on_defeats_only() {
        let table = TrainingTable::lightning_rod();
        assert!(table.evaluate(SkillRank::R5, &hit_event(false, true)).is_empty());
        assert_eq!(
            table.evaluate(SkillRank::R5, &hit_event(true, true)),
            vec![
                TrainingCondition::HIT_OR_DEFEAT,
                TrainingCondition::FULL_CHARGE
            ]
        );
    }

    #[test]
    fn top_ranks_reward_charged_multi_defeats() {
        let table = TrainingTable::lightning_rod();
        assert_eq!(
            table.evaluate(SkillRank::R1, &pack_event(5, 6, true)),
            vec![
                TrainingCondition::MULTI_DEFEAT,
                TrainingCondition::MULTI_DEFEAT_FULL_CHARGE
            ]
        );
        assert_eq!(
            table.evaluate(SkillRank::R2, &pack_event(4, 4, false)),
            vec![TrainingCondition::MULTI_DEFEAT]
        );
        assert!(table.evaluate(SkillRank::R2, &pack_event(3, 4, true)).is_empty());
    }

    #[test]
    fn novice_has_no_rules() {
        let table = TrainingTable::lightning_rod();
        assert!(table.evaluate(SkillRank::Novice, &hit_event(true, true)).is_empty());
    }
}
