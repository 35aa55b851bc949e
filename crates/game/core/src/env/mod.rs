//! Collaborators the engine reads from or reports to.
//!
//! Read-only oracles (rank tables, RNG, spatial queries) are bundled in
//! [`Env`]; outbound sinks travel separately in [`CastSinks`] because they
//! need mutable access.
mod error;
mod rng;
mod sinks;
mod spatial;
mod tables;

pub use error::OracleError;
pub use rng::{PcgRng, RngOracle, RollSlot, compute_seed};
pub use sinks::{
    BroadcastSink, CastSinks, EffectNotice, EffectStage, ProgressionSink, RecordingSink,
    SkillNotice,
};
pub use spatial::{RegionScan, SpatialQuery};
pub use tables::{RankParams, RankTable, RankTableOracle};

/// Aggregates the read-only oracles needed to resolve a cast.
pub struct Env<'a, T, R, S>
where
    T: RankTableOracle + ?Sized,
    R: RngOracle + ?Sized,
    S: SpatialQuery + ?Sized,
{
    tables: Option<&'a T>,
    rng: Option<&'a R>,
    spatial: Option<&'a S>,
}

impl<T, R, S> Clone for Env<'_, T, R, S>
where
    T: RankTableOracle + ?Sized,
    R: RngOracle + ?Sized,
    S: SpatialQuery + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R, S> Copy for Env<'_, T, R, S>
where
    T: RankTableOracle + ?Sized,
    R: RngOracle + ?Sized,
    S: SpatialQuery + ?Sized,
{
}

pub type SkillEnv<'a> =
    Env<'a, dyn RankTableOracle + 'a, dyn RngOracle + 'a, dyn SpatialQuery + 'a>;

impl<'a, T, R, S> Env<'a, T, R, S>
where
    T: RankTableOracle + ?Sized,
    R: RngOracle + ?Sized,
    S: SpatialQuery + ?Sized,
{
    pub fn new(tables: Option<&'a T>, rng: Option<&'a R>, spatial: Option<&'a S>) -> Self {
        Self {
            tables,
            rng,
            spatial,
        }
    }

    pub fn with_all(tables: &'a T, rng: &'a R, spatial: &'a S) -> Self {
        Self::new(Some(tables), Some(rng), Some(spatial))
    }

    pub fn empty() -> Self {
        Self::new(None, None, None)
    }

    /// # Errors
    ///
    /// `OracleError::TablesNotAvailable` if no rank table was provided.
    pub fn tables(&self) -> Result<&'a T, OracleError> {
        self.tables.ok_or(OracleError::TablesNotAvailable)
    }

    pub fn rng(&self) -> Result<&'a R, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    pub fn spatial(&self) -> Result<&'a S, OracleError> {
        self.spatial.ok_or(OracleError::SpatialNotAvailable)
    }
}

impl<'a, T, R, S> Env<'a, T, R, S>
where
    T: RankTableOracle + 'a,
    R: RngOracle + 'a,
    S: SpatialQuery + 'a,
{
    /// Erases the concrete oracle types.
    pub fn into_skill_env(self) -> SkillEnv<'a> {
        let tables: Option<&'a dyn RankTableOracle> = self.tables.map(|t| t as _);
        let rng: Option<&'a dyn RngOracle> = self.rng.map(|r| r as _);
        let spatial: Option<&'a dyn SpatialQuery> = self.spatial.map(|s| s as _);
        Env::new(tables, rng, spatial)
    }
}
