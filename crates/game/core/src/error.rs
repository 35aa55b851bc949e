//! Common error infrastructure for skill-core.
//!
//! Domain errors (`CastError`, `DamageError`, `PackError`, ...) live next to
//! the code that raises them. They all implement [`GameError`] so the runtime
//! can classify a failure without matching on every concrete type.

use crate::state::{EntityId, Millis, SkillId};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed later (mana regenerates,
///   stun wears off)
/// - **Validation**: the request itself is invalid and must not be retried
/// - **Internal**: a state inconsistency that points at a bug
/// - **Fatal**: the region state can no longer be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Where and when an error was raised.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ErrorContext {
    pub caster: Option<EntityId>,
    pub skill: Option<SkillId>,
    pub at: Millis,
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(at: Millis) -> Self {
        Self {
            caster: None,
            skill: None,
            at,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_caster(mut self, caster: EntityId) -> Self {
        self.caster = Some(caster);
        self
    }

    #[must_use]
    pub const fn with_skill(mut self, skill: SkillId) -> Self {
        self.skill = Some(skill);
        self
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all skill-core errors.
///
/// Implementors derive `thiserror::Error` for `Display` and classify each
/// variant by recoverability, not by impact.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Context captured at the point of failure, if the error carries one.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Stable identifier for metrics and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
