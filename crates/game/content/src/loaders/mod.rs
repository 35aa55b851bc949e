//! Content loaders for reading skill data from files.
//!
//! Skill descriptors and rank tables come from RON, combat constants from
//! TOML. Everything is validated here so the engine can trust what it gets.

pub mod config;
pub mod factory;
pub mod skills;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use skills::{LoadedSkills, RankEntry, SkillCatalog, SkillLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
