//! Worker tasks that back the runtime orchestration.
//!
//! One region worker runs per hosted region and owns that region outright.

mod region;
mod training;

pub use region::{Command, RegionWorker};
pub use training::TrainingSubscriber;
