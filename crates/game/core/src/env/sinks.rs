//! Outbound collaborators: the broadcast sink and the progression bus.
//!
//! Both are fire-and-forget. The engine never waits for an acknowledgment and
//! never inspects what a sink did with a message.

use crate::combat::{CombatActionPack, LocationId};
use crate::state::{EntityId, Position, SkillId};
use crate::training::ProgressionEvent;

/// Phase of a skill's visual effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum EffectStage {
    Clear = 0,
    /// Charging circle shown while the skill is readied.
    Charging = 2,
    /// Discharge toward the target area.
    Discharge = 3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectNotice {
    pub effect_id: u32,
    pub stage: EffectStage,
    /// Where the effect lands, for stages that point somewhere.
    pub anchor: Option<Position>,
}

/// Skill lifecycle notification for clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillNotice {
    Ready,
    Use {
        target_area: LocationId,
        targets: u16,
    },
    Complete,
    /// A silent cancel tells only the caster; the cast never started.
    Cancel { silent: bool },
}

pub trait BroadcastSink {
    fn publish(&mut self, pack: &CombatActionPack);

    fn notify_effect(&mut self, entity: EntityId, effect: EffectNotice);

    fn notify_skill(&mut self, entity: EntityId, skill: SkillId, notice: SkillNotice);

    fn notify_skill_ready(&mut self, entity: EntityId, skill: SkillId) {
        self.notify_skill(entity, skill, SkillNotice::Ready);
    }

    fn notify_skill_use(
        &mut self,
        entity: EntityId,
        skill: SkillId,
        target_area: LocationId,
        targets: u16,
    ) {
        self.notify_skill(
            entity,
            skill,
            SkillNotice::Use {
                target_area,
                targets,
            },
        );
    }

    fn notify_skill_complete(&mut self, entity: EntityId, skill: SkillId) {
        self.notify_skill(entity, skill, SkillNotice::Complete);
    }

    fn notify_skill_cancel(&mut self, entity: EntityId, skill: SkillId, silent: bool) {
        self.notify_skill(entity, skill, SkillNotice::Cancel { silent });
    }
}

pub trait ProgressionSink {
    fn emit(&mut self, event: ProgressionEvent);
}

/// Sink pair handed to every engine operation.
pub struct CastSinks<'a> {
    pub broadcast: &'a mut dyn BroadcastSink,
    pub progression: &'a mut dyn ProgressionSink,
}

impl<'a> CastSinks<'a> {
    pub fn new(
        broadcast: &'a mut dyn BroadcastSink,
        progression: &'a mut dyn ProgressionSink,
    ) -> Self {
        Self {
            broadcast,
            progression,
        }
    }
}

/// Keeps everything it receives; used by tests and offline tools.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub packs: Vec<CombatActionPack>,
    pub effects: Vec<(EntityId, EffectNotice)>,
    pub notices: Vec<(EntityId, SkillId, SkillNotice)>,
    pub progression: Vec<ProgressionEvent>,
}

impl RecordingSink {
    pub fn notices_for(&self, entity: EntityId) -> impl Iterator<Item = &SkillNotice> {
        self.notices
            .iter()
            .filter(move |(e, _, _)| *e == entity)
            .map(|(_, _, notice)| notice)
    }

    pub fn effect_stages(&self, entity: EntityId) -> Vec<EffectStage> {
        self.effects
            .iter()
            .filter(|(e, _)| *e == entity)
            .map(|(_, effect)| effect.stage)
            .collect()
    }
}

impl BroadcastSink for RecordingSink {
    fn publish(&mut self, pack: &CombatActionPack) {
        self.packs.push(pack.clone());
    }

    fn notify_effect(&mut self, entity: EntityId, effect: EffectNotice) {
        self.effects.push((entity, effect));
    }

    fn notify_skill(&mut self, entity: EntityId, skill: SkillId, notice: SkillNotice) {
        self.notices.push((entity, skill, notice));
    }
}

impl ProgressionSink for RecordingSink {
    fn emit(&mut self, event: ProgressionEvent) {
        self.progression.push(event);
    }
}
