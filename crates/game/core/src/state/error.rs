//! Region store errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::EntityId;

/// Errors raised while reading or mutating a [`Region`](super::Region).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionError {
    #[error("entity {0} is not in this region")]
    EntityNotFound(EntityId),

    #[error("entity {0} is already present in this region")]
    DuplicateEntity(EntityId),
}

impl GameError for RegionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EntityNotFound(_) => ErrorSeverity::Validation,
            Self::DuplicateEntity(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EntityNotFound(_) => "REGION_ENTITY_NOT_FOUND",
            Self::DuplicateEntity(_) => "REGION_DUPLICATE_ENTITY",
        }
    }
}
