//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and the skill engine so clients
//! can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use skill_core::{CastError, ErrorSeverity, GameError, RegionError, RegionId};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("region worker command channel closed")]
    CommandChannelClosed,

    #[error("region worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("region worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires skill content to be configured before building")]
    MissingContent,

    #[error("{0:?} is not hosted by this runtime")]
    UnknownRegion(RegionId),

    #[error("{0:?} was added twice")]
    DuplicateRegion(RegionId),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Region(#[from] RegionError),
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cast(err) => err.severity(),
            Self::Region(err) => err.severity(),
            Self::UnknownRegion(_) => ErrorSeverity::Validation,
            Self::MissingContent | Self::DuplicateRegion(_) => ErrorSeverity::Fatal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::MissingContent => "RUNTIME_MISSING_CONTENT",
            Self::UnknownRegion(_) => "RUNTIME_UNKNOWN_REGION",
            Self::DuplicateRegion(_) => "RUNTIME_DUPLICATE_REGION",
            Self::Cast(err) => err.error_code(),
            Self::Region(err) => err.error_code(),
        }
    }
}
