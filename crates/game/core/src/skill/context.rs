use crate::schedule::TimerHandle;
use crate::state::{EntityId, Locks, Millis, PropId, SkillId};

/// Per-cast scratch state, owned by the engine from prepare until the cast
/// completes or is canceled, then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastContext {
    pub caster: EntityId,
    pub skill: SkillId,
    pub prepared_at: Millis,
    pub full_charge: bool,
    held_locks: Locks,
    released: bool,
    artifacts: Vec<(PropId, Option<TimerHandle>)>,
}

impl CastContext {
    pub(crate) fn new(
        caster: EntityId,
        skill: SkillId,
        prepared_at: Millis,
        held_locks: Locks,
    ) -> Self {
        Self {
            caster,
            skill,
            prepared_at,
            full_charge: false,
            held_locks,
            released: false,
            artifacts: Vec::new(),
        }
    }

    /// Locks this cast acquired and still owes a release for.
    pub fn held_locks(&self) -> Locks {
        self.held_locks
    }

    pub fn props(&self) -> impl Iterator<Item = PropId> + '_ {
        self.artifacts.iter().map(|(prop, _)| *prop)
    }

    pub(crate) fn hold(&mut self, locks: Locks) {
        self.held_locks |= locks;
    }

    /// Hands out the held locks exactly once; `None` on a second call.
    pub(crate) fn take_locks(&mut self) -> Option<Locks> {
        if self.released {
            return None;
        }
        self.released = true;
        Some(std::mem::take(&mut self.held_locks))
    }

    pub(crate) fn track(&mut self, prop: PropId, cleanup: Option<TimerHandle>) {
        self.artifacts.push((prop, cleanup));
    }

    pub(crate) fn take_artifacts(&mut self) -> Vec<(PropId, Option<TimerHandle>)> {
        std::mem::take(&mut self.artifacts)
    }
}
