use crate::CollectError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Number of physical lines the simulator prints per algorithm run
pub const BLOCK_LINES: usize = 8;

/// Literal that terminates an algorithm identifier on a block's first line
pub const CACHE_SIZE_MARKER: &str = "cache size";

/// How much of a block's first line forms its merge key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierMode {
    /// Everything up to and including `cache size`
    #[default]
    Label,
    /// `Label` plus the cache size digits that follow the marker
    LabelAndSize,
}

/// What to do with a raw file whose line count is not a multiple of `BLOCK_LINES`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingFragment {
    #[default]
    Drop,
    Keep,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the merge key of `line`, or `None` if the marker is absent.
///
/// This is a literal substring search on the first occurrence of
/// [`CACHE_SIZE_MARKER`]; nothing before it is interpreted.
pub fn extract_identifier(line: &str, mode: IdentifierMode) -> Option<Identifier> {
    let start = line.find(CACHE_SIZE_MARKER)?;
    let mut end = start + CACHE_SIZE_MARKER.len();

    if mode == IdentifierMode::LabelAndSize {
        let rest = &line[end..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            end += rest.len() - trimmed.len() + digits;
        }
    }

    Some(Identifier(line[..end].to_string()))
}

/// One algorithm's result lines, keyed by the identifier on its first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    pub identifier: Identifier,
    pub lines: Vec<String>,
}

impl RecordBlock {
    /// Builds a block from `lines`, keyed by the first line. Leading
    /// whitespace on the first line is ignored for keying.
    pub fn from_lines(lines: Vec<String>, mode: IdentifierMode) -> Option<Self> {
        let identifier = extract_identifier(lines.first()?.trim_start(), mode)?;
        Some(RecordBlock { identifier, lines })
    }
}

/// Partitions raw simulator output into blocks at offsets `0, K, 2K, ...`.
///
/// Chunks whose first line carries no identifier are skipped. A short final
/// chunk is handled according to `policy`.
pub fn split_raw_blocks(
    lines: &[String],
    mode: IdentifierMode,
    policy: TrailingFragment,
    source: &Path,
) -> Result<Vec<RecordBlock>, CollectError> {
    let mut blocks = Vec::with_capacity(lines.len() / BLOCK_LINES + 1);

    for (index, chunk) in lines.chunks(BLOCK_LINES).enumerate() {
        if chunk.len() < BLOCK_LINES {
            match policy {
                TrailingFragment::Drop => {
                    warn!(
                        path = %source.display(),
                        lines = chunk.len(),
                        "dropping trailing fragment"
                    );
                    continue;
                }
                TrailingFragment::Reject => {
                    return Err(CollectError::Fragment {
                        path: source.to_path_buf(),
                        lines: chunk.len(),
                    });
                }
                TrailingFragment::Keep => {}
            }
        }

        match RecordBlock::from_lines(chunk.to_vec(), mode) {
            Some(block) => blocks.push(block),
            None => warn!(
                path = %source.display(),
                offset = index * BLOCK_LINES,
                "block has no \"{}\" marker on its first line, skipping",
                CACHE_SIZE_MARKER
            ),
        }
    }

    Ok(blocks)
}
