use crate::file_map::Family;
use crate::record::{IdentifierMode, TrailingFragment};
use crate::CollectError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the finalized-results folder under the results root
pub const FINALIZED_DIR_NAME: &str = "project cachesim";

/// Name of the aggregate mirror folder under the finalized root
pub const ALL_RESULTS_DIR_NAME: &str = "all";

/// Where raw results are found, where collected files go, and how they are keyed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectConfig {
    pub results_root: PathBuf,
    pub finalized_root: PathBuf,
    pub all_results_dir: PathBuf,
    #[serde(default = "Family::defaults")]
    pub families: Vec<Family>,
    #[serde(default)]
    pub identifier_mode: IdentifierMode,
    #[serde(default)]
    pub trailing_fragment: TrailingFragment,
}

impl CollectConfig {
    /// Standard layout rooted at `root`:
    /// `root/` raw files, `root/project cachesim/<family>/` collected files,
    /// `root/project cachesim/all/` mirror
    pub fn default_for(root: impl Into<PathBuf>) -> Self {
        let results_root = root.into();
        let finalized_root = results_root.join(FINALIZED_DIR_NAME);
        let all_results_dir = finalized_root.join(ALL_RESULTS_DIR_NAME);
        CollectConfig {
            results_root,
            finalized_root,
            all_results_dir,
            families: Family::defaults(),
            identifier_mode: IdentifierMode::default(),
            trailing_fragment: TrailingFragment::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CollectError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CollectError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: CollectConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), CollectError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(CollectError::Io)
    }

    pub fn validate(&self) -> Result<(), CollectError> {
        for family in &self.families {
            if family.pattern.is_empty() {
                return Err(CollectError::Config(format!(
                    "family {} has an empty pattern",
                    family.name
                )));
            }
            family.compiled_pattern()?;
            if family.from_suffix.is_empty() {
                return Err(CollectError::Config(format!(
                    "family {} has an empty from_suffix",
                    family.name
                )));
            }
        }
        Ok(())
    }

    pub fn family_dir(&self, family: &Family) -> PathBuf {
        self.finalized_root.join(&family.subdir)
    }
}
