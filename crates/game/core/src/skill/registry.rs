use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::state::SkillId;

use super::descriptor::SkillDescriptor;
use super::strategy::{CastHook, HostileOnly, TargetFilter, TargetMarker};

/// A registered skill: its descriptor plus the strategies selected for it.
#[derive(Clone)]
pub struct SkillEntry {
    pub descriptor: SkillDescriptor,
    filter: Arc<dyn TargetFilter>,
    hooks: Vec<Arc<dyn CastHook>>,
}

impl SkillEntry {
    pub fn filter(&self) -> &dyn TargetFilter {
        self.filter.as_ref()
    }

    pub fn hooks(&self) -> impl Iterator<Item = &dyn CastHook> {
        self.hooks.iter().map(|hook| hook.as_ref())
    }

    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }
}

impl std::fmt::Debug for SkillEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillEntry")
            .field("descriptor", &self.descriptor)
            .field("hooks", &self.hook_names())
            .finish()
    }
}

/// Every skill the engine can run, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct SkillRegistry {
    entries: BTreeMap<SkillId, SkillEntry>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in Lightning Rod.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SkillDescriptor::lightning_rod());
        registry
    }

    /// Registers a descriptor with the default hostile-only filter, plus a
    /// target marker hook when the descriptor declares one. Replaces any
    /// previous entry for the same id.
    pub fn register(&mut self, descriptor: SkillDescriptor) -> &mut SkillEntry {
        let mut hooks: Vec<Arc<dyn CastHook>> = Vec::new();
        if let Some(marker) = descriptor.marker {
            hooks.push(Arc::new(TargetMarker::new(marker)));
        }
        let id = descriptor.id;
        let entry = SkillEntry {
            descriptor,
            filter: Arc::new(HostileOnly),
            hooks,
        };
        match self.entries.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    pub fn set_filter(&mut self, skill: SkillId, filter: Arc<dyn TargetFilter>) -> bool {
        match self.entries.get_mut(&skill) {
            Some(entry) => {
                entry.filter = filter;
                true
            }
            None => false,
        }
    }

    pub fn add_hook(&mut self, skill: SkillId, hook: Arc<dyn CastHook>) -> bool {
        match self.entries.get_mut(&skill) {
            Some(entry) => {
                entry.hooks.push(hook);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, skill: SkillId) -> Option<&SkillEntry> {
        self.entries.get(&skill)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &SkillDescriptor> {
        self.entries.values().map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
