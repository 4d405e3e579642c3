use crate::config::CollectConfig;
use crate::file_handler::{self, MissingFile};
use crate::file_map::SimulationFileMap;
use crate::record::{
    self, extract_identifier, Identifier, IdentifierMode, RecordBlock, TrailingFragment, BLOCK_LINES,
};
use crate::CollectError;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// A parsed collected file: blocks and stray lines in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectedEntry {
    Block(RecordBlock),
    Loose(String),
}

impl CollectedEntry {
    fn lines(&self) -> &[String] {
        match self {
            CollectedEntry::Block(block) => &block.lines,
            CollectedEntry::Loose(line) => std::slice::from_ref(line),
        }
    }
}

/// Split collected lines into blocks.
///
/// A line carrying an identifier opens a block. The block runs for up to
/// `BLOCK_LINES` lines and ends early where a line with a different label
/// starts. Lines inside a block are kept verbatim, blank ones included.
/// Outside blocks, blank lines are discarded and anything else is kept as a
/// loose line.
pub fn parse_collected(lines: Vec<String>, mode: IdentifierMode) -> Vec<CollectedEntry> {
    let mut entries = Vec::new();
    let mut lines = lines.into_iter().peekable();

    while let Some(line) = lines.next() {
        // separators left between blocks by older runs
        if line.trim().is_empty() {
            continue;
        }

        // Boundaries always compare labels: every line the simulator prints
        // for one run repeats the same label with a different size
        let Some(label) = extract_identifier(line.trim_start(), IdentifierMode::Label) else {
            entries.push(CollectedEntry::Loose(line));
            continue;
        };

        let mut body = vec![line];
        while body.len() < BLOCK_LINES {
            let continues = lines.peek().is_some_and(|next| !opens_other_block(next, &label));
            if !continues {
                break;
            }
            body.extend(lines.next());
        }

        // fragments merged under TrailingFragment::Keep end up here
        if body.len() < BLOCK_LINES {
            debug!(label = %label, lines = body.len(), "short block in collected file");
        }
        entries.extend(RecordBlock::from_lines(body, mode).map(CollectedEntry::Block));
    }

    entries
}

fn opens_other_block(line: &str, label: &Identifier) -> bool {
    extract_identifier(line.trim_start(), IdentifierMode::Label).is_some_and(|id| id != *label)
}

/// Newest block per identifier, in first-seen order
#[derive(Debug, Default)]
struct LatestBlocks {
    blocks: Vec<RecordBlock>,
    index: FxHashMap<Identifier, usize>,
}

impl LatestBlocks {
    fn from_blocks(blocks: Vec<RecordBlock>) -> Self {
        let mut latest = LatestBlocks::default();
        for block in blocks {
            match latest.index.get(&block.identifier) {
                Some(&i) => latest.blocks[i] = block,
                None => {
                    latest.index.insert(block.identifier.clone(), latest.blocks.len());
                    latest.blocks.push(block);
                }
            }
        }
        latest
    }

    fn contains(&self, identifier: &Identifier) -> bool {
        self.index.contains_key(identifier)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Raw blocks that replaced an existing collected block
    pub replaced: usize,
    /// Raw blocks with no previous collected block
    pub added: usize,
    /// Collected blocks kept unchanged
    pub carried: usize,
    /// Collected lines outside any block, kept unchanged
    pub loose: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    SkippedMissingRaw,
    Merged(MergeStats),
}

#[derive(Debug, Default)]
pub struct MergeReport {
    pub merged: Vec<(PathBuf, MergeStats)>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, CollectError)>,
}

impl MergeReport {
    pub fn totals(&self) -> MergeStats {
        self.merged.iter().fold(MergeStats::default(), |acc, (_, s)| MergeStats {
            replaced: acc.replaced + s.replaced,
            added: acc.added + s.added,
            carried: acc.carried + s.carried,
            loose: acc.loose + s.loose,
        })
    }
}

/// Merges raw simulator output into collected result files
#[derive(Debug, Clone)]
pub struct Merger {
    all_results_dir: PathBuf,
    identifier_mode: IdentifierMode,
    trailing_fragment: TrailingFragment,
}

impl Merger {
    pub fn new(all_results_dir: impl Into<PathBuf>) -> Self {
        Merger {
            all_results_dir: all_results_dir.into(),
            identifier_mode: IdentifierMode::default(),
            trailing_fragment: TrailingFragment::default(),
        }
    }

    pub fn from_config(config: &CollectConfig) -> Self {
        Merger::new(config.all_results_dir.clone())
            .with_identifier_mode(config.identifier_mode)
            .with_trailing_fragment(config.trailing_fragment)
    }

    pub fn with_identifier_mode(mut self, mode: IdentifierMode) -> Self {
        self.identifier_mode = mode;
        self
    }

    pub fn with_trailing_fragment(mut self, policy: TrailingFragment) -> Self {
        self.trailing_fragment = policy;
        self
    }

    pub fn all_results_dir(&self) -> &Path {
        &self.all_results_dir
    }

    /// Where the mirror copy of `collected` is written
    pub fn mirror_path(&self, collected: &Path) -> Result<PathBuf, CollectError> {
        let name = collected.file_name().ok_or_else(|| {
            CollectError::Other(format!("collected path has no file name: {}", collected.display()))
        })?;
        Ok(self.all_results_dir.join(name))
    }

    /// Merge one raw file into its collected file and mirror the result.
    ///
    /// A missing raw file leaves both outputs untouched.
    #[instrument(skip_all, fields(raw = %raw.display()))]
    pub fn merge_one(&self, raw: &Path, collected: &Path) -> Result<MergeOutcome, CollectError> {
        let raw_lines = match file_handler::read_lines(raw, MissingFile::Fail) {
            Ok(lines) => lines,
            Err(CollectError::NotFound(_)) => {
                debug!("raw file not found, skipping");
                return Ok(MergeOutcome::SkippedMissingRaw);
            }
            Err(e) => return Err(e),
        };

        let raw_blocks =
            record::split_raw_blocks(&raw_lines, self.identifier_mode, self.trailing_fragment, raw)?;
        let latest = LatestBlocks::from_blocks(raw_blocks);

        let existing = file_handler::read_lines(collected, MissingFile::Empty)?;
        let entries = parse_collected(existing, self.identifier_mode);

        let mut stats = MergeStats::default();
        let mut output: Vec<String> = Vec::with_capacity(raw_lines.len());
        let mut replaced_ids: Vec<&Identifier> = Vec::new();

        for entry in &entries {
            match entry {
                CollectedEntry::Block(block) if latest.contains(&block.identifier) => {
                    replaced_ids.push(&block.identifier);
                    continue;
                }
                CollectedEntry::Block(_) => stats.carried += 1,
                CollectedEntry::Loose(_) => stats.loose += 1,
            }
            output.extend(entry.lines().iter().cloned());
        }

        for block in &latest.blocks {
            if replaced_ids.contains(&&block.identifier) {
                stats.replaced += 1;
            } else {
                stats.added += 1;
            }
            output.extend(block.lines.iter().cloned());
        }

        terminate_inner_lines(&mut output);

        let mirror = self.mirror_path(collected)?;
        file_handler::write_lines(collected, &output)?;
        file_handler::write_lines(&mirror, &output)?;

        info!(
            collected = %collected.display(),
            replaced = stats.replaced,
            added = stats.added,
            carried = stats.carried,
            "merged"
        );
        Ok(MergeOutcome::Merged(stats))
    }

    /// Run `merge_one` over every pair in order; one pair failing does not
    /// stop the rest
    pub fn merge_all(&self, map: &SimulationFileMap) -> MergeReport {
        let mut report = MergeReport::default();

        for pair in map {
            match self.merge_one(&pair.raw, &pair.collected) {
                Ok(MergeOutcome::Merged(stats)) => report.merged.push((pair.collected.clone(), stats)),
                Ok(MergeOutcome::SkippedMissingRaw) => report.skipped.push(pair.raw.clone()),
                Err(e) => {
                    warn!(raw = %pair.raw.display(), error = %e, "merge failed");
                    report.failed.push((pair.raw.clone(), e));
                }
            }
        }

        report
    }
}

/// Lines are concatenated without separators, so a line missing its
/// terminator must not run into the next one.
fn terminate_inner_lines(lines: &mut [String]) {
    let Some((_, inner)) = lines.split_last_mut() else {
        return;
    };
    for line in inner {
        if !line.ends_with('\n') {
            line.push('\n');
        }
    }
}
