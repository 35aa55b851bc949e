//! Event types for different topics.

use serde::{Deserialize, Serialize};

use skill_core::training::TrainingGrant;
use skill_core::{
    CastRequest, CombatActionPack, EffectNotice, EntityId, Millis, ProgressionEvent, RegionId,
    SkillId, SkillNotice,
};

/// Packs committed inside a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CombatEvent {
    PackPublished {
        region: RegionId,
        pack: Box<CombatActionPack>,
    },
}

/// Client-facing notifications: effects, lifecycle notices and failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NotificationEvent {
    Effect {
        region: RegionId,
        entity: EntityId,
        effect: EffectNotice,
    },
    Skill {
        region: RegionId,
        entity: EntityId,
        skill: SkillId,
        notice: SkillNotice,
    },
    /// A cast request failed; the worker kept running.
    CastFailed {
        region: RegionId,
        caster: EntityId,
        skill: SkillId,
        request: CastRequest,
        code: String,
        severity: String,
        message: String,
        at: Millis,
    },
}

/// Combat outcomes and the training they produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressionNotice {
    Attacked {
        region: RegionId,
        event: ProgressionEvent,
    },
    Trained {
        region: RegionId,
        caster: EntityId,
        grant: TrainingGrant,
    },
}
