use crate::CollectError;
use itertools::Itertools;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

fn result_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // lazy `.*?` so the object miss ratio wins over a later `byte miss ratio`
        Regex::new(r"(?P<label>\S+)\s+cache size\s+(?P<size>\d+),.*?miss ratio\s+(?P<ratio>\d+\.\d+)")
            .expect("result line regex is valid")
    })
}

/// One simulator result line, e.g.
/// `fiu_casa.bin S3FIFO-0.1-2 cache size 4096, 1000 req, miss ratio 0.2500, ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultLine {
    /// Algorithm name without parameters (`S3FIFO`)
    pub algorithm: String,
    /// Full label as printed (`S3FIFO-0.1-2`)
    pub label: String,
    pub cache_size: u64,
    pub miss_ratio: f64,
}

impl ResultLine {
    pub fn parse(line: &str) -> Option<ResultLine> {
        let caps = result_line_regex().captures(line)?;
        let label = caps["label"].to_string();
        let algorithm = label.split('-').next().unwrap_or(&label).to_string();
        Some(ResultLine {
            algorithm,
            label,
            cache_size: caps["size"].parse().ok()?,
            miss_ratio: caps["ratio"].parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub cache_size: u64,
    pub miss_ratio: f64,
}

/// Miss ratio against cache size for one named series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub name: String,
    pub points: Vec<CurvePoint>,
}

/// Group result lines into curves.
///
/// A line starting with `#` opens a section and names the curve that
/// follows. Result lines outside any section are grouped by their label.
pub fn parse_curves(text: &str) -> Vec<Curve> {
    let mut curves: Vec<Curve> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut section: Option<String> = None;

    for line in text.lines() {
        if let Some(header) = line.strip_prefix('#') {
            let name = header.trim().to_string();
            curve_index(&mut curves, &mut index, &name);
            section = Some(name);
            continue;
        }

        let Some(result) = ResultLine::parse(line) else {
            continue;
        };
        let name = section.clone().unwrap_or_else(|| result.label.clone());
        let i = curve_index(&mut curves, &mut index, &name);
        curves[i].points.push(CurvePoint {
            cache_size: result.cache_size,
            miss_ratio: result.miss_ratio,
        });
    }

    for curve in &mut curves {
        curve.points.sort_by_key(|p| p.cache_size);
    }
    curves
}

fn curve_index(curves: &mut Vec<Curve>, index: &mut FxHashMap<String, usize>, name: &str) -> usize {
    *index.entry(name.to_string()).or_insert_with(|| {
        curves.push(Curve { name: name.to_string(), points: Vec::new() });
        curves.len() - 1
    })
}

/// Averaged miss ratios of two algorithms at one cache size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaPoint {
    pub cache_size: u64,
    pub baseline: f64,
    pub candidate: f64,
    /// `candidate - baseline`; negative means the candidate misses less
    pub delta: f64,
}

/// Expand directories into the files they contain, sorted by path
pub fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CollectError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in fs::read_dir(input).map_err(CollectError::Io)? {
                let path = entry.map_err(CollectError::Io)?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(CollectError::NotFound(input.clone()));
        }
    }
    files.sort();
    Ok(files)
}

/// Compare two algorithms across result files.
///
/// Miss ratios are averaged per algorithm and cache size over all files;
/// only sizes where both algorithms appear produce a point.
pub fn delta(files: &[PathBuf], baseline: &str, candidate: &str) -> Result<Vec<DeltaPoint>, CollectError> {
    let mut sums: BTreeMap<(u64, bool), (f64, usize)> = BTreeMap::new();

    for file in files {
        let text = read_text(file)?;
        let mut matched = 0;
        for result in text.lines().filter_map(ResultLine::parse) {
            let is_candidate = if result.algorithm == candidate {
                true
            } else if result.algorithm == baseline {
                false
            } else {
                continue;
            };
            let entry = sums.entry((result.cache_size, is_candidate)).or_insert((0.0, 0));
            entry.0 += result.miss_ratio;
            entry.1 += 1;
            matched += 1;
        }
        debug!(file = %file.display(), matched, "scanned result file");
    }

    let averages: BTreeMap<(u64, bool), f64> = sums
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect();

    let points = averages
        .keys()
        .map(|&(size, _)| size)
        .dedup()
        .filter_map(|size| {
            let baseline = *averages.get(&(size, false))?;
            let candidate = *averages.get(&(size, true))?;
            Some(DeltaPoint { cache_size: size, baseline, candidate, delta: candidate - baseline })
        })
        .collect();

    Ok(points)
}

pub fn mean_delta(points: &[DeltaPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().map(|p| p.delta).sum::<f64>() / points.len() as f64)
}

fn read_text(path: &Path) -> Result<String, CollectError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CollectError::NotFound(path.to_path_buf()),
        _ => CollectError::Io(e),
    })
}
