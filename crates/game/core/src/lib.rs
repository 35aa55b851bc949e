//! Deterministic combat-skill logic shared by the runtime and offline tools.
//!
//! `skill-core` defines the canonical rules for executing a skill against a
//! region: attack geometry, the damage pipeline, combat action packs, the
//! skill lifecycle and training progression. It performs no I/O and never
//! reads a clock; every operation takes the current [`Millis`] and its
//! collaborators explicitly. All cast state mutation flows through
//! [`skill::SkillEngine`].
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod geometry;
pub mod schedule;
pub mod skill;
pub mod state;
pub mod training;

pub use combat::{
    AttackerAction, AttackerOptions, CombatAction, CombatActionPack, DamageOutcome,
    DamagePipeline, KnockbackDecision, LocationId, PackError, TargetAction, TargetOptions,
};
pub use config::CombatConfig;
pub use env::{
    BroadcastSink, CastSinks, EffectNotice, EffectStage, Env, OracleError, PcgRng,
    ProgressionSink, RankParams, RankTable, RankTableOracle, RecordingSink, RegionScan,
    RngOracle, SkillEnv, SkillNotice, SpatialQuery,
};
pub use error::{ErrorContext, ErrorSeverity, GameError};
pub use geometry::{AttackRegion, Facing, GeometryError, Point, build_attack_region};
pub use schedule::{ScheduledTask, TimerHandle, TimerQueue};
pub use skill::{
    CastError, CastHook, CastRequest, PrepareOutcome, SkillDescriptor, SkillEngine, SkillRegistry,
    TargetFilter, UseReport,
};
pub use state::{
    Combatant, EntityId, Faction, LockHolds, LockManager, Locks, Millis, Position, PropId, Region,
    RegionError, RegionId, ResourceMeter, SkillId, SkillRank, SkillState, TrainingCondition,
};
pub use training::{ProgressionEvent, TrainingObserver, TrainingTable};
