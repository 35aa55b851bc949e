//! Skill catalog loader.
//!
//! One RON file carries both the descriptors and the per-rank parameters:
//!
//! ```ron
//! SkillCatalog(
//!     skills: [ (id: (30202), name: "Lightning Rod", ...) ],
//!     ranks: [ (skill: (30202), rank: RF, params: (min_damage: 50, ...)) ],
//! )
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skill_core::{RankParams, RankTable, SkillDescriptor, SkillId, SkillRank, SkillRegistry};

use crate::loaders::{LoadResult, read_file};

/// Per-rank parameters of one skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    pub skill: SkillId,
    pub rank: SkillRank,
    pub params: RankParams,
}

/// Skill catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<SkillDescriptor>,
    #[serde(default)]
    pub ranks: Vec<RankEntry>,
}

/// Validated catalog, ready to hand to the runtime.
#[derive(Debug, Clone)]
pub struct LoadedSkills {
    pub registry: SkillRegistry,
    pub ranks: RankTable,
}

/// Loader for skill catalogs from RON files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load a skill catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<LoadedSkills> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid skill catalog {}: {}", path.display(), e))
    }

    /// Catalog shipped with the crate.
    pub fn builtin() -> LoadResult<LoadedSkills> {
        Self::parse(include_str!("../../data/skills.ron"))
    }

    pub fn parse(content: &str) -> LoadResult<LoadedSkills> {
        let catalog: SkillCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;
        Self::build(catalog)
    }

    fn build(catalog: SkillCatalog) -> LoadResult<LoadedSkills> {
        let mut registry = SkillRegistry::new();
        let mut known = BTreeSet::new();
        for descriptor in catalog.skills {
            if !known.insert(descriptor.id) {
                anyhow::bail!("skill {} is defined twice", descriptor.id);
            }
            let shape = descriptor.shape;
            if !(shape.length > 0.0 && shape.width > 0.0 && shape.forward_offset.is_finite()) {
                anyhow::bail!("skill {} has a degenerate attack shape", descriptor.id);
            }
            if descriptor.knockback_distance.is_nan() || descriptor.knockback_distance < 0.0 {
                anyhow::bail!("skill {} has a negative knockback distance", descriptor.id);
            }
            registry.register(descriptor);
        }

        let mut ranks = RankTable::new();
        let mut seen = BTreeSet::new();
        for entry in catalog.ranks {
            if !known.contains(&entry.skill) {
                anyhow::bail!("rank {} refers to unknown {}", entry.rank, entry.skill);
            }
            if !seen.insert((entry.skill, entry.rank)) {
                anyhow::bail!("rank {} of {} is defined twice", entry.rank, entry.skill);
            }
            let params = entry.params;
            if params.min_damage > params.max_damage {
                anyhow::bail!(
                    "rank {} of {}: min_damage {} exceeds max_damage {}",
                    entry.rank,
                    entry.skill,
                    params.min_damage,
                    params.max_damage
                );
            }
            if params.mana_cost.is_nan() || params.mana_cost < 0.0 {
                anyhow::bail!("rank {} of {}: negative mana cost", entry.rank, entry.skill);
            }
            ranks.insert(entry.skill, entry.rank, params);
        }

        Ok(LoadedSkills { registry, ranks })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use skill_core::{Locks, RankTableOracle, TrainingTable};

    use super::*;

    #[test]
    fn builtin_catalog_matches_lightning_rod() {
        let loaded = SkillLoader::builtin().unwrap();
        let entry = loaded.registry.get(SkillId::LIGHTNING_ROD).unwrap();
        assert_eq!(entry.descriptor, SkillDescriptor::lightning_rod());
        assert_eq!(entry.hook_names(), vec!["target_marker"]);
        assert_eq!(entry.descriptor.cast_locks, Locks::MOVEMENT);
        assert_eq!(entry.descriptor.training, TrainingTable::lightning_rod());

        assert_eq!(loaded.ranks.len(), 16);
        let rf = loaded
            .ranks
            .rank_params(SkillId::LIGHTNING_ROD, SkillRank::RF)
            .unwrap();
        assert_eq!((rf.min_damage, rf.max_damage), (50, 70));
        assert_eq!(rf.charge_bonus_percent, 20);
    }

    const MINIMAL: &str = r#"
        SkillCatalog(
            skills: [(
                id: (7),
                name: "Test Bolt",
                shape: (forward_offset: 100.0, length: 200.0, width: 50.0),
                base_stun_ms: 500,
                knockback_distance: 0.0,
                effect_id: 1,
                cast_locks: ("WALK"),
                reaction_skill: (7),
            )],
            ranks: [(
                skill: (7),
                rank: Novice,
                params: (min_damage: 1, max_damage: 2, max_charge_ms: 0, charge_bonus_percent: 0),
            )],
        )
    "#;

    #[test]
    fn optional_fields_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let loaded = SkillLoader::load(file.path()).unwrap();
        let entry = loaded.registry.get(SkillId(7)).unwrap();
        assert!(entry.descriptor.auto_complete);
        assert!(!entry.descriptor.requires_right_hand);
        assert!(entry.descriptor.marker.is_none());
        assert!(entry.hook_names().is_empty());
        let params = loaded.ranks.rank_params(SkillId(7), SkillRank::Novice).unwrap();
        assert_eq!(params.mana_cost, 0.0);
    }

    #[test]
    fn rejects_ranks_for_unknown_skills() {
        let content = MINIMAL.replace("ranks: [(skill: (7)", "ranks: [(skill: (8)");
        let err = SkillLoader::parse(&content).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn rejects_inverted_damage_range() {
        let content =
            MINIMAL.replace("min_damage: 1, max_damage: 2", "min_damage: 3, max_damage: 2");
        assert!(SkillLoader::parse(&content).is_err());
    }

    #[test]
    fn reports_path_on_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"SkillCatalog(skills: [").unwrap();
        let err = SkillLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid skill catalog"));
    }
}
