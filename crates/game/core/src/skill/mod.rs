//! Skill definitions and the lifecycle engine that executes them.
//!
//! A skill is data ([`SkillDescriptor`]) plus behavior picked by identity from
//! the [`SkillRegistry`]: a target filter and zero or more use hooks. The
//! [`SkillEngine`] owns every in-flight cast of a region.

mod context;
mod descriptor;
mod error;
mod machine;
mod registry;
mod strategy;

pub use context::CastContext;
pub use descriptor::{MarkerProp, RegionShape, SkillDescriptor};
pub use error::{CastError, CastRequest, PreconditionFailure};
pub use machine::{PrepareOutcome, SkillEngine, UseReport};
pub use registry::{SkillEntry, SkillRegistry};
pub use strategy::{CastHook, CastSite, HookOutput, HostileOnly, TargetFilter, TargetMarker};
