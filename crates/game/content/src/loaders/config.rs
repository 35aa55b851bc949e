//! Combat configuration loader.

use std::path::Path;

use skill_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`CombatConfig::default`].
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse combat config TOML: {}", e))?;

        if config.critical_multiplier.is_nan() || config.critical_multiplier < 1.0 {
            anyhow::bail!(
                "critical_multiplier must be at least 1.0, got {}",
                config.critical_multiplier
            );
        }
        if !(0.0..=100.0).contains(&config.critical_chance_cap) {
            anyhow::bail!(
                "critical_chance_cap must be a percentage, got {}",
                config.critical_chance_cap
            );
        }
        if config.min_hit_damage.is_nan() || config.min_hit_damage < 0.0 {
            anyhow::bail!("min_hit_damage must not be negative");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "game_seed = 42").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.game_seed, 42);
        assert_eq!(
            config.critical_multiplier,
            CombatConfig::DEFAULT_CRITICAL_MULTIPLIER
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(ConfigLoader::parse("critical_chance_cap = 150.0").is_err());
        assert!(ConfigLoader::parse("critical_multiplier = 0.5").is_err());
        assert!(ConfigLoader::parse("min_hit_damage = -1.0").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load(&dir.path().join("combat.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn shipped_config_parses() {
        let config = ConfigLoader::parse(include_str!("../../data/combat.toml")).unwrap();
        assert_eq!(config, CombatConfig::default());
    }
}
