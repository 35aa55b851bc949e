//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{SkillId, SkillRank};

/// Required read-only data is unavailable.
///
/// The engine cannot resolve a cast without these, so every variant ends the
/// cast that hit it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("RankTableOracle not available")]
    TablesNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,

    #[error("SpatialQuery not available")]
    SpatialNotAvailable,

    #[error("no rank parameters for {skill} at rank {rank}")]
    RankParamsNotFound { skill: SkillId, rank: SkillRank },
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TablesNotAvailable | Self::RngNotAvailable | Self::SpatialNotAvailable => {
                ErrorSeverity::Fatal
            }
            Self::RankParamsNotFound { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TablesNotAvailable => "ORACLE_TABLES_NOT_AVAILABLE",
            Self::RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            Self::SpatialNotAvailable => "ORACLE_SPATIAL_NOT_AVAILABLE",
            Self::RankParamsNotFound { .. } => "ORACLE_RANK_PARAMS_NOT_FOUND",
        }
    }
}
