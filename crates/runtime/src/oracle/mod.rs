//! Runtime wrappers around static skill content.
//!
//! [`OracleManager`] bundles the read-only collaborators the engine needs so
//! each region worker can build a [`skill_core::SkillEnv`] on demand. The data
//! is immutable at runtime; dynamic state lives in the region.
mod spatial;

use std::sync::Arc;

use skill_content::LoadedSkills;
use skill_core::{
    Env, PcgRng, RankTable, RankTableOracle, RngOracle, SkillEnv, SkillRegistry, SpatialQuery,
};

pub use spatial::GridSpatialIndex;

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) ranks: Arc<RankTable>,
    pub(crate) registry: Arc<SkillRegistry>,
    pub(crate) rng: PcgRng,
}

impl OracleManager {
    pub fn new(ranks: Arc<RankTable>, registry: Arc<SkillRegistry>) -> Self {
        Self {
            ranks,
            registry,
            rng: PcgRng, // PcgRng is stateless
        }
    }

    /// Wraps loaded content.
    pub fn from_content(content: LoadedSkills) -> Self {
        Self::new(Arc::new(content.ranks), Arc::new(content.registry))
    }

    /// Converts the oracles into the engine's environment, using the
    /// caller's spatial index.
    pub fn skill_env<'a>(&'a self, spatial: &'a (dyn SpatialQuery + 'a)) -> SkillEnv<'a> {
        let ranks: &'a dyn RankTableOracle = self.ranks.as_ref();
        let rng: &'a dyn RngOracle = &self.rng;
        Env::new(Some(ranks), Some(rng), Some(spatial))
    }

    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }
}
