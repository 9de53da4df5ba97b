//! RON content loader

use crate::error::{Error, Result};
use crate::schema::{CatalogFile, DifficultyFile, TalentFile};
use guildedin_core::{Catalog, StaticTalentPool, TemplateBasis};
use guildedin_hub::DifficultyTable;
use log::{debug, warn};
use std::fs;
use std::path::Path;

const STANDARD_CATALOG: &str = include_str!("../content/catalog.ron");
const STANDARD_TALENT: &str = include_str!("../content/talent.ron");
const STANDARD_DIFFICULTY: &str = include_str!("../content/difficulty.ron");

/// Loaded game content
#[derive(Debug, Default)]
pub struct Content {
    /// Dungeons, equipment, facilities and expense templates
    pub catalog: Catalog,
    /// Recruitment candidates
    pub talent: StaticTalentPool,
    /// Balance per difficulty tier; tiers not loaded keep their defaults
    pub difficulties: DifficultyTable,
}

/// Loader for RON content files
pub struct Loader {
    content: Content,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            content: Content::default(),
        }
    }

    /// The built-in content shipped with the crate
    pub fn standard() -> Result<Content> {
        let mut loader = Self::new();
        loader.load_catalog_str(STANDARD_CATALOG)?;
        loader.load_talent_str(STANDARD_TALENT)?;
        loader.load_difficulty_str(STANDARD_DIFFICULTY)?;
        loader.finish()
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if filename.contains("talent") || content.contains("candidates:") {
            self.load_talent_str(&content)
        } else if filename.contains("difficulty") || content.contains("tiers:") {
            self.load_difficulty_str(&content)
        } else if filename.contains("catalog")
            || content.contains("dungeons:")
            || content.contains("templates:")
            || content.contains("equipment:")
            || content.contains("facilities:")
        {
            self.load_catalog_str(&content)
        } else {
            Err(Error::InvalidSchema(format!(
                "could not tell what {:?} contains",
                path
            )))
        }
    }

    /// Load all RON files from a directory
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::result::Result<_, _>>()?;
        // Directory order is platform dependent
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Load catalog definitions from a RON string
    pub fn load_catalog_str(&mut self, content: &str) -> Result<()> {
        let file: CatalogFile = ron::from_str(content)?;
        let catalog = &mut self.content.catalog;

        for item in file.equipment {
            if item.name.is_empty() {
                return Err(Error::MissingField(format!("{}.name", item.id)));
            }
            if catalog.equipment.contains_key(&item.id) {
                return Err(Error::DuplicateDefinition(item.id.to_string()));
            }
            catalog.equipment.insert(item.id.clone(), item);
        }

        for dungeon in file.dungeons {
            if dungeon.name.is_empty() {
                return Err(Error::MissingField(format!("{}.name", dungeon.id)));
            }
            if dungeon.min_team_size == 0 || dungeon.min_team_size > dungeon.max_team_size {
                return Err(Error::InvalidSchema(format!(
                    "{} team size {}..={}",
                    dungeon.id, dungeon.min_team_size, dungeon.max_team_size
                )));
            }
            if !(0.0..=1.0).contains(&dungeon.injury_chance) {
                return Err(Error::InvalidSchema(format!(
                    "{} injury chance {} outside 0..=1",
                    dungeon.id, dungeon.injury_chance
                )));
            }
            if catalog.dungeons.contains_key(&dungeon.id) {
                return Err(Error::DuplicateDefinition(dungeon.id.to_string()));
            }
            catalog.dungeons.insert(dungeon.id.clone(), dungeon);
        }

        for facility in file.facilities {
            if facility.max_level == 0 {
                return Err(Error::InvalidSchema(format!(
                    "{} has max level 0",
                    facility.kind
                )));
            }
            if catalog.facilities.contains_key(&facility.kind) {
                return Err(Error::DuplicateDefinition(facility.kind.to_string()));
            }
            catalog.facilities.insert(facility.kind, facility);
        }

        for template in file.templates {
            if catalog.templates.iter().any(|t| t.id == template.id) {
                return Err(Error::DuplicateDefinition(template.id.to_string()));
            }
            if let TemplateBasis::Action(kind) = template.basis {
                if catalog.action_template(kind).is_some() {
                    return Err(Error::DuplicateDefinition(format!(
                        "second template for {}",
                        kind
                    )));
                }
            }
            catalog.templates.push(template);
        }

        debug!(
            "catalog now has {} dungeons, {} items, {} facilities, {} templates",
            catalog.dungeons.len(),
            catalog.equipment.len(),
            catalog.facilities.len(),
            catalog.templates.len()
        );
        Ok(())
    }

    /// Load talent-pool candidates from a RON string
    pub fn load_talent_str(&mut self, content: &str) -> Result<()> {
        let file: TalentFile = ron::from_str(content)?;
        let pool = &mut self.content.talent.candidates;

        for candidate in file.candidates {
            if candidate.name.is_empty() {
                return Err(Error::MissingField(format!("{}.name", candidate.id)));
            }
            if candidate.weight == 0 {
                return Err(Error::InvalidSchema(format!(
                    "{} has draw weight 0",
                    candidate.id
                )));
            }
            if pool.iter().any(|c| c.id == candidate.id) {
                return Err(Error::DuplicateDefinition(candidate.id.to_string()));
            }
            pool.push(candidate);
        }

        debug!("talent pool now has {} candidates", pool.len());
        Ok(())
    }

    /// Load difficulty tiers from a RON string
    ///
    /// Each tier replaces the built-in profile for that difficulty. A tier
    /// may appear only once per file.
    pub fn load_difficulty_str(&mut self, content: &str) -> Result<()> {
        let file: DifficultyFile = ron::from_str(content)?;

        let mut seen = Vec::new();
        for tier in file.tiers {
            if seen.contains(&tier.difficulty) {
                return Err(Error::DuplicateDefinition(tier.difficulty.to_string()));
            }
            let profile = &tier.profile;
            if profile.day_limit == 0 {
                return Err(Error::InvalidSchema(format!(
                    "{} has day limit 0",
                    tier.difficulty
                )));
            }
            if profile.cost_scaling_pct == 0 || profile.reward_scaling_pct == 0 {
                return Err(Error::InvalidSchema(format!(
                    "{} scales costs or rewards to nothing",
                    tier.difficulty
                )));
            }
            seen.push(tier.difficulty);
            self.content.difficulties.set(tier.difficulty, tier.profile);
        }
        Ok(())
    }

    /// Finish loading, checking the catalog's cross references
    pub fn finish(self) -> Result<Content> {
        let content = self.content;
        content
            .catalog
            .validate()
            .map_err(|err| Error::InvalidSchema(err.to_string()))?;
        if content.talent.candidates.is_empty() {
            warn!("content has no recruitment candidates");
        }
        Ok(content)
    }

    /// Get the current content (for inspection during loading)
    pub fn content(&self) -> &Content {
        &self.content
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildedin_core::{
        ActionKind, DefId, Difficulty, FacilityKind, TalentPool,
    };

    const TALENT: &str = r#"
    (
        candidates: [
            (
                id: "casey",
                name: "Casey",
                class: PrManager,
                seniority: Associate,
                stats: (values: (40, 20, 25, 30, 20, 45)),
                hire_cost: 400,
                salary: 30,
                weight: 2,
            ),
        ]
    )
    "#;

    #[test]
    fn test_standard_content_is_complete() {
        let content = Loader::standard().unwrap();
        let catalog = &content.catalog;

        for kind in ActionKind::ALL {
            assert!(catalog.action_template(kind).is_some(), "{}", kind);
        }
        for kind in FacilityKind::ALL {
            assert!(catalog.facility(kind).is_some(), "{}", kind);
        }
        assert!(catalog.upkeep_templates().count() > 0);
        assert!(catalog.dungeons.len() >= 5);
        assert!(content.talent.candidates().len() >= 8);
        assert_eq!(content.talent.candidates()[0].stats.total(), 197);
        for d in Difficulty::ALL {
            assert!(content.difficulties.profiles.contains_key(&d));
        }
    }

    #[test]
    fn test_load_talent() {
        let mut loader = Loader::new();
        loader.load_talent_str(TALENT).unwrap();
        let pool = &loader.content().talent;
        assert_eq!(pool.candidates().len(), 1);
        assert_eq!(pool.candidates()[0].id, DefId::new("casey"));
    }

    #[test]
    fn test_duplicate_candidate_rejected() {
        let mut loader = Loader::new();
        loader.load_talent_str(TALENT).unwrap();
        assert!(matches!(
            loader.load_talent_str(TALENT),
            Err(Error::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut loader = Loader::new();
        let content = TALENT.replace("weight: 2", "weight: 0");
        assert!(matches!(
            loader.load_talent_str(&content),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_second_action_template_rejected() {
        let content = r#"
        (
            templates: [
                (id: "a", name: "A", category: TrainingCosts, basis: Action(Training), base_cost: 10),
                (id: "b", name: "B", category: TrainingCosts, basis: Action(Training), base_cost: 20),
            ]
        )
        "#;
        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_catalog_str(content),
            Err(Error::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn test_finish_rejects_incomplete_catalog() {
        let mut loader = Loader::new();
        loader
            .load_catalog_str(
                r#"(templates: [(id: "rent", name: "Rent", category: GuildOverhead, basis: Upkeep, base_cost: 100)])"#,
            )
            .unwrap();
        assert!(matches!(loader.finish(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_difficulty_override() {
        let content = r#"
        (
            tiers: [
                (
                    difficulty: Executive,
                    profile: (
                        starting_treasury: 1,
                        starting_roster_size: 1,
                        day_limit: 10,
                        target_treasury: 2,
                        target_reputation: 3,
                        cost_scaling_pct: 200,
                        reward_scaling_pct: 50,
                    ),
                ),
            ]
        )
        "#;
        let mut loader = Loader::new();
        loader.load_difficulty_str(content).unwrap();
        let table = &loader.content().difficulties;
        assert_eq!(table.profile(Difficulty::Executive).starting_treasury, 1);
        assert_eq!(
            table.profile(Difficulty::Intern),
            guildedin_hub::default_profile(Difficulty::Intern)
        );
    }

    #[test]
    fn test_bad_ron_reports_parse_error() {
        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_talent_str("(candidates: [ (id: ) ])"),
            Err(Error::Ron(_))
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = std::env::temp_dir().join(format!("guildedin-script-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("catalog.ron"), STANDARD_CATALOG).unwrap();
        fs::write(dir.join("talent.ron"), TALENT).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut loader = Loader::new();
        loader.load_directory(&dir).unwrap();
        let content = loader.finish().unwrap();
        assert_eq!(content.talent.candidates.len(), 1);
        assert!(content.catalog.dungeons.len() >= 5);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_directory("/definitely/not/here"),
            Err(Error::Io(_))
        ));
    }
}
