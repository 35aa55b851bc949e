//! Content factory for loading everything the runtime needs from one directory.

use std::path::{Path, PathBuf};

use skill_core::CombatConfig;

use crate::loaders::{ConfigLoader, LoadResult, LoadedSkills, SkillLoader};

/// Content factory that loads all skill content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── combat.toml
/// └── skills.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub const CONFIG_FILE: &'static str = "combat.toml";
    pub const SKILLS_FILE: &'static str = "skills.ron";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat configuration from `combat.toml`; defaults when the file
    /// is absent.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join(Self::CONFIG_FILE);
        if !path.exists() {
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load skill descriptors and rank tables from `skills.ron`.
    pub fn load_skills(&self) -> LoadResult<LoadedSkills> {
        let path = self.data_dir.join(Self::SKILLS_FILE);
        SkillLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_directory_and_defaults_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(ContentFactory::SKILLS_FILE),
            include_str!("../../data/skills.ron"),
        )
        .unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), CombatConfig::default());
        let skills = factory.load_skills().unwrap();
        assert_eq!(skills.registry.len(), 1);
    }

    #[test]
    fn shipped_data_directory_loads() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        factory.load_config().unwrap();

        let skills = factory.load_skills().unwrap();
        let entry = skills.registry.get(skill_core::SkillId::LIGHTNING_ROD).unwrap();
        assert_eq!(entry.descriptor.cast_locks, skill_core::Locks::MOVEMENT);
        assert_eq!(
            entry.descriptor.attacker_options,
            skill_core::AttackerOptions::KNOCKBACK_HIT | skill_core::AttackerOptions::USE_EFFECT
        );
    }

    #[test]
    fn missing_skills_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentFactory::new(dir.path()).load_skills().is_err());
    }
}
