//! Data-driven skill content and loaders.
//!
//! This crate provides loaders for RON/TOML data files:
//! - Skill descriptors with their training tables (RON)
//! - Per-rank skill parameters (RON, same file)
//! - Combat configuration (TOML)
//!
//! Content is consumed by runtime oracles and never appears in region state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, LoadResult, LoadedSkills, RankEntry, SkillCatalog, SkillLoader,
};
