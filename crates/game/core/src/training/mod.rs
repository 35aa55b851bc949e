//! Training progression driven by combat outcomes.
//!
//! Packs emit [`ProgressionEvent`]s when they commit; a [`TrainingObserver`]
//! per skill turns them into condition counts on the caster's skill instance.
//! Observers never call into the skill engine and the engine never calls them.
mod event;
mod observer;
mod table;

pub use event::{CasterAttacked, DefeatRecord, ProgressionEvent, TargetAttacked};
pub use observer::{TrainingGrant, TrainingObserver};
pub use table::{TrainingRule, TrainingTable, TrainingTier};
