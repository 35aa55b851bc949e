//! Runtime orchestration for the skill engine.
//!
//! This crate wires the deterministic engine from `skill-core` into async
//! region workers, a topic-based event bus and training subscribers that
//! read combat outcomes back off that bus.
//! Consumers embed [`Runtime`] and talk to each region through a
//! [`RegionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`oracle`] bundles static content and the spatial index
//! - `workers` keeps background tasks internal to the crate; only
//!   [`TrainingSubscriber`] is re-exported
pub mod api;
pub mod events;
pub mod oracle;
pub mod runtime;

mod workers;

pub use api::{RegionHandle, Result, RuntimeError};
pub use events::{
    BusSink, CombatEvent, Event, EventBus, NotificationEvent, ProgressionNotice, Topic,
};
pub use oracle::{GridSpatialIndex, OracleManager};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::TrainingSubscriber;
