//! Pluggable per-skill behavior selected by skill identity.

use crate::geometry::Facing;
use crate::schedule::ScheduledTask;
use crate::state::{Combatant, EntityId, Millis, Position, PropId, Region, SkillId};

use super::descriptor::MarkerProp;

/// Decides whether a candidate inside the attack region is actually hit.
pub trait TargetFilter: Send + Sync {
    fn is_targetable(&self, caster: &Combatant, candidate: &Combatant) -> bool;
}

/// Not the caster, still alive, and of a hostile faction.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostileOnly;

impl TargetFilter for HostileOnly {
    fn is_targetable(&self, caster: &Combatant, candidate: &Combatant) -> bool {
        candidate.id != caster.id
            && !candidate.is_dead()
            && caster.faction.is_hostile_to(candidate.faction)
    }
}

/// Where a skill is being used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastSite {
    pub caster: EntityId,
    pub skill: SkillId,
    pub pivot: Position,
    pub facing: Facing,
    pub now: Millis,
}

/// World changes a hook made that the engine must track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HookOutput {
    pub prop: Option<PropId>,
    /// Task to run later and when; canceled if the cast aborts.
    pub cleanup: Option<(Millis, ScheduledTask)>,
}

/// Extra effect run on use, after the attack region is known and before
/// targets resolve.
pub trait CastHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_use(&self, region: &mut Region, site: &CastSite) -> HookOutput;
}

/// Places a marker prop at the pivot and schedules its removal.
#[derive(Clone, Copy, Debug)]
pub struct TargetMarker {
    marker: MarkerProp,
}

impl TargetMarker {
    pub fn new(marker: MarkerProp) -> Self {
        Self { marker }
    }
}

impl CastHook for TargetMarker {
    fn name(&self) -> &'static str {
        "target_marker"
    }

    fn on_use(&self, region: &mut Region, site: &CastSite) -> HookOutput {
        let prop = region.add_prop(self.marker.class, site.pivot, site.facing);
        HookOutput {
            prop: Some(prop),
            cleanup: Some((site.now + self.marker.lifetime_ms, ScheduledTask::RemoveProp(prop))),
        }
    }
}
