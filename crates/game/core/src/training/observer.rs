use crate::state::{SkillId, SkillSet, TrainingCondition};

use super::event::ProgressionEvent;
use super::table::TrainingTable;

/// Condition advanced by an observed event and its new count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingGrant {
    pub skill: SkillId,
    pub condition: TrainingCondition,
    pub count: u32,
}

/// Grants training for one skill from combat outcomes.
///
/// Events reach every observer; anything about another skill, or a caster who
/// never learned this one, is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingObserver {
    skill: SkillId,
    table: TrainingTable,
}

impl TrainingObserver {
    pub fn new(skill: SkillId, table: TrainingTable) -> Self {
        Self { skill, table }
    }

    pub fn skill(&self) -> SkillId {
        self.skill
    }

    pub fn observe(&self, event: &ProgressionEvent, skills: &mut SkillSet) -> Vec<TrainingGrant> {
        if event.skill() != self.skill {
            return Vec::new();
        }
        let Some(instance) = skills.get_mut(self.skill) else {
            return Vec::new();
        };
        self.table
            .evaluate(instance.rank, event)
            .into_iter()
            .filter_map(|condition| {
                instance.train(condition).map(|count| TrainingGrant {
                    skill: self.skill,
                    condition,
                    count,
                })
            })
            .collect()
    }
}
