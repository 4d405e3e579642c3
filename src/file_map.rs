use crate::config::CollectConfig;
use crate::CollectError;
use glob::Pattern;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix written by the simulator for every raw result file
pub const ORACLE_GENERAL_SUFFIX: &str = ".oracleGeneral.bin";
pub const TXT_SUFFIX: &str = ".txt";
pub const IQI_BIN_TXT_SUFFIX: &str = ".IQI.bin.txt";

/// A data-set family: which raw files belong to it and how their collected
/// files are named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub name: String,
    /// Filename wildcard matched against bare names in the results root
    pub pattern: String,
    pub subdir: String,
    pub from_suffix: String,
    pub to_suffix: String,
    #[serde(default)]
    pub strip_prefix: Option<String>,
}

impl Family {
    pub fn new(name: &str, pattern: &str, subdir: &str, to_suffix: &str) -> Self {
        Family {
            name: name.to_string(),
            pattern: pattern.to_string(),
            subdir: subdir.to_string(),
            from_suffix: ORACLE_GENERAL_SUFFIX.to_string(),
            to_suffix: to_suffix.to_string(),
            strip_prefix: None,
        }
    }

    pub fn with_strip_prefix(mut self, prefix: &str) -> Self {
        self.strip_prefix = Some(prefix.to_string());
        self
    }

    /// FIU, MSR, CloudPhysics, Alibaba and Tencent block traces
    pub fn defaults() -> Vec<Family> {
        vec![
            Family::new("FIU", "fiu*.bin", "FIU", TXT_SUFFIX),
            Family::new("MSR", "msr*.bin", "MSR", IQI_BIN_TXT_SUFFIX).with_strip_prefix("msr_"),
            Family::new("CloudPhysics", "w*.bin", "Cloudphysics", TXT_SUFFIX),
            Family::new("Alibaba", "io_traces.ns*.bin", "AlibabaBlock", TXT_SUFFIX),
            Family::new("Tencent", "tencentBlock.ns*.bin", "TencentBlock", TXT_SUFFIX),
        ]
    }

    /// Shell-style wildcard: `*`, `?` and `[...]` classes
    pub fn compiled_pattern(&self) -> Result<Pattern, CollectError> {
        Pattern::new(&self.pattern).map_err(|e| {
            CollectError::Config(format!(
                "family {} has a bad pattern {:?}: {}",
                self.name, self.pattern, e
            ))
        })
    }

    pub fn collected_name(&self, raw_name: &str) -> String {
        let renamed = raw_name.replace(&self.from_suffix, &self.to_suffix);
        match &self.strip_prefix {
            Some(prefix) if !prefix.is_empty() => renamed.replace(prefix.as_str(), ""),
            _ => renamed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub raw: PathBuf,
    pub collected: PathBuf,
}

/// Ordered work list of raw files and the collected files they merge into
#[derive(Debug, Clone, Default)]
pub struct SimulationFileMap {
    pairs: Vec<FilePair>,
    index: FxHashMap<PathBuf, usize>,
}

impl SimulationFileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `results_root` once per family and map every match to its
    /// collected path
    pub fn build(config: &CollectConfig) -> Result<Self, CollectError> {
        let mut map = SimulationFileMap::new();
        let names = list_file_names(&config.results_root)?;

        for family in &config.families {
            let family_dir = config.family_dir(family);
            let pattern = family.compiled_pattern()?;
            let mut matched = 0;
            // names are bare file names, so `*` never has a separator to cross
            for name in names.iter().filter(|n| pattern.matches(n)) {
                let raw = config.results_root.join(name);
                let collected = family_dir.join(family.collected_name(name));
                map.insert(raw, collected);
                matched += 1;
            }
            debug!(family = %family.name, matched, "scanned results root");
        }

        Ok(map)
    }

    /// Add a pair. Re-inserting a raw path replaces its collected path but
    /// keeps its original position.
    pub fn insert(&mut self, raw: PathBuf, collected: PathBuf) {
        if let Some(&i) = self.index.get(&raw) {
            self.pairs[i].collected = collected;
            return;
        }
        self.index.insert(raw.clone(), self.pairs.len());
        self.pairs.push(FilePair { raw, collected });
    }

    pub fn get(&self, raw: &Path) -> Option<&Path> {
        self.index.get(raw).map(|&i| self.pairs[i].collected.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilePair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<'a> IntoIterator for &'a SimulationFileMap {
    type Item = &'a FilePair;
    type IntoIter = std::slice::Iter<'a, FilePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, CollectError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %dir.display(), "results root does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(CollectError::Io(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(CollectError::Io)?;
        if !entry.file_type().map_err(CollectError::Io)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
