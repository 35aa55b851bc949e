//! Cast errors and their mapping onto the shared severity taxonomy.

use crate::combat::{DamageError, PackError};
use crate::env::OracleError;
use crate::error::{ErrorSeverity, GameError};
use crate::geometry::GeometryError;
use crate::state::{EntityId, Locks, RegionError, SkillId, SkillState};

/// Lifecycle request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CastRequest {
    Prepare,
    Use,
    Complete,
    Cancel,
}

/// Why a prepare ended in a silent cancel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PreconditionFailure {
    MissingRightHand,
    InsufficientMana { required: f32, available: f32 },
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CastError {
    #[error("{0} is not a registered skill")]
    UnknownSkill(SkillId),

    #[error("caster {0} not found")]
    CasterNotFound(EntityId),

    #[error("{caster} has not learned {skill}")]
    NotLearned { caster: EntityId, skill: SkillId },

    /// The request is not valid from the instance's current state. Nothing
    /// was changed.
    #[error("{request} is not valid for {skill} in state {from}")]
    InvalidTransition {
        skill: SkillId,
        from: SkillState,
        request: CastRequest,
    },

    #[error("{required} mana required, {available} available")]
    InsufficientMana { required: f32, available: f32 },

    /// Locks of a cast were released twice, or released bits did not match
    /// what the cast held.
    #[error("lock release mismatch on {caster}: held {held:?}, released {released:?}")]
    LockRelease {
        caster: EntityId,
        held: Locks,
        released: Locks,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Damage(#[from] DamageError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Region(#[from] RegionError),
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSkill(_)
            | Self::CasterNotFound(_)
            | Self::NotLearned { .. }
            | Self::InvalidTransition { .. } => ErrorSeverity::Validation,
            Self::InsufficientMana { .. } => ErrorSeverity::Recoverable,
            Self::LockRelease { .. } => ErrorSeverity::Internal,
            Self::Oracle(err) => err.severity(),
            Self::Geometry(err) => err.severity(),
            Self::Damage(err) => err.severity(),
            Self::Pack(err) => err.severity(),
            Self::Region(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSkill(_) => "CAST_UNKNOWN_SKILL",
            Self::CasterNotFound(_) => "CAST_CASTER_NOT_FOUND",
            Self::NotLearned { .. } => "CAST_NOT_LEARNED",
            Self::InvalidTransition { .. } => "CAST_INVALID_TRANSITION",
            Self::InsufficientMana { .. } => "CAST_INSUFFICIENT_MANA",
            Self::LockRelease { .. } => "CAST_LOCK_RELEASE",
            Self::Oracle(err) => err.error_code(),
            Self::Geometry(err) => err.error_code(),
            Self::Damage(err) => err.error_code(),
            Self::Pack(err) => err.error_code(),
            Self::Region(err) => err.error_code(),
        }
    }
}
