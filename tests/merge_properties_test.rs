use cachesim_collect::file_handler::{read_lines, write_lines, MissingFile};
use cachesim_collect::merger::{MergeOutcome, Merger};
use cachesim_collect::record::{IdentifierMode, TrailingFragment, BLOCK_LINES};
use std::fs;
use std::path::{Path, PathBuf};

struct Fixture {
    _dir: tempfile::TempDir,
    raw: PathBuf,
    collected: PathBuf,
    all: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("fiu_casa.oracleGeneral.bin");
        let collected = dir.path().join("FIU").join("fiu_casa.txt");
        let all = dir.path().join("all");
        Fixture { _dir: dir, raw, collected, all }
    }

    fn merger(&self) -> Merger {
        Merger::new(&self.all)
    }

    fn mirror(&self) -> PathBuf {
        self.all.join("fiu_casa.txt")
    }

    fn collected_lines(&self) -> Vec<String> {
        read_lines(&self.collected, MissingFile::Fail).unwrap()
    }
}

fn block(header: &str, tag: &str) -> Vec<String> {
    let mut out = vec![format!("{}\n", header)];
    for i in 2..=BLOCK_LINES {
        out.push(format!("{}-l{}\n", tag, i));
    }
    out
}

fn blocks(parts: &[(&str, &str)]) -> Vec<String> {
    parts.iter().flat_map(|(h, t)| block(h, t)).collect()
}

fn write(path: &Path, lines: &[String]) {
    write_lines(path, lines).unwrap();
}

#[test]
fn test_replacing_single_block_keeps_only_raw_version() {
    let fx = Fixture::new();
    write(&fx.collected, &block("A cache size", "old"));
    let raw = block("A cache size", "new");
    write(&fx.raw, &raw);

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    assert_eq!(fx.collected_lines(), raw);
}

#[test]
fn test_merge_is_idempotent() {
    let fx = Fixture::new();
    write(
        &fx.collected,
        &blocks(&[("t ALG-X cache size 10", "x"), ("t ALG-Y cache size 10", "old-y")]),
    );
    write(
        &fx.raw,
        &blocks(&[("t ALG-Y cache size 10", "new-y"), ("t ALG-Z cache size 10", "z")]),
    );

    let merger = fx.merger();
    merger.merge_one(&fx.raw, &fx.collected).unwrap();
    let first = fs::read(&fx.collected).unwrap();

    merger.merge_one(&fx.raw, &fx.collected).unwrap();
    let second = fs::read(&fx.collected).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_absent_identifier_is_carried_over_before_new_blocks() {
    let fx = Fixture::new();
    let x = block("t ALG-X cache size 10", "x");
    let old_y = block("t ALG-Y cache size 10", "old-y");
    let new_y = block("t ALG-Y cache size 10", "new-y");

    let mut collected = old_y.clone();
    collected.extend(x.clone());
    write(&fx.collected, &collected);
    write(&fx.raw, &new_y);

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    let mut expected = x;
    expected.extend(new_y);
    assert_eq!(fx.collected_lines(), expected);
    assert!(!fx.collected_lines().contains(&"old-y-l2\n".to_string()));
}

#[test]
fn test_last_block_wins_within_raw_file() {
    let fx = Fixture::new();
    write(
        &fx.raw,
        &blocks(&[
            ("t ALG-A cache size 10", "first"),
            ("t ALG-B cache size 10", "b"),
            ("t ALG-A cache size 20", "second"),
        ]),
    );

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    let lines = fx.collected_lines();
    let mut expected = block("t ALG-A cache size 20", "second");
    expected.extend(block("t ALG-B cache size 10", "b"));
    assert_eq!(lines, expected);
}

#[test]
fn test_with_size_keeps_cache_sizes_apart() {
    let fx = Fixture::new();
    let raw = blocks(&[("t ALG-A cache size 10", "ten"), ("t ALG-A cache size 20", "twenty")]);
    write(&fx.raw, &raw);

    fx.merger()
        .with_identifier_mode(IdentifierMode::LabelAndSize)
        .merge_one(&fx.raw, &fx.collected)
        .unwrap();

    assert_eq!(fx.collected_lines(), raw);
}

#[test]
fn test_mirror_matches_collected() {
    let fx = Fixture::new();
    write(&fx.collected, &block("t ALG-X cache size 10", "x"));
    write(&fx.raw, &block("t ALG-Y cache size 10", "y"));

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    assert_eq!(fs::read(&fx.collected).unwrap(), fs::read(fx.mirror()).unwrap());
}

#[test]
fn test_blank_lines_are_dropped() {
    let fx = Fixture::new();
    let x = block("t ALG-X cache size 10", "x");
    let mut collected = vec!["\n".to_string()];
    collected.extend(x.clone());
    collected.push("  \n".to_string());
    write(&fx.collected, &collected);
    write(&fx.raw, &block("t ALG-Y cache size 10", "y"));

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    let lines = fx.collected_lines();
    assert!(lines.iter().all(|l| !l.trim().is_empty()));
    assert_eq!(&lines[..BLOCK_LINES], x.as_slice());
}

#[test]
fn test_missing_raw_file_touches_nothing() {
    let fx = Fixture::new();
    let original = block("t ALG-X cache size 10", "x");
    write(&fx.collected, &original);

    let outcome = fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    assert_eq!(outcome, MergeOutcome::SkippedMissingRaw);
    assert_eq!(fx.collected_lines(), original);
    assert!(!fx.mirror().exists());
}

#[test]
fn test_missing_collected_file_starts_empty() {
    let fx = Fixture::new();
    let raw = block("t ALG-X cache size 10", "x");
    write(&fx.raw, &raw);

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    assert_eq!(fx.collected_lines(), raw);
    assert!(fx.mirror().exists());
}

#[test]
fn test_unterminated_last_line_does_not_join_next_block() {
    let fx = Fixture::new();
    let mut x = block("t ALG-X cache size 10", "x");
    let last = x.pop().unwrap();
    x.push(last.trim_end().to_string());
    write(&fx.collected, &x);
    write(&fx.raw, &block("t ALG-Y cache size 10", "y"));

    fx.merger().merge_one(&fx.raw, &fx.collected).unwrap();

    let lines = fx.collected_lines();
    assert_eq!(lines.len(), 2 * BLOCK_LINES);
    assert_eq!(lines[BLOCK_LINES], "t ALG-Y cache size 10\n");
}

#[test]
fn test_rejected_fragment_leaves_files_untouched() {
    let fx = Fixture::new();
    let mut raw = block("t ALG-X cache size 10", "x");
    raw.push("t ALG-Y cache size 10\n".to_string());
    write(&fx.raw, &raw);

    let result = fx
        .merger()
        .with_trailing_fragment(TrailingFragment::Reject)
        .merge_one(&fx.raw, &fx.collected);

    assert!(result.is_err());
    assert!(!fx.collected.exists());
}

#[test]
fn test_blank_line_inside_block_stays_idempotent() {
    let fx = Fixture::new();
    let mut a = block("A cache size 1", "a");
    a[3] = "\n".to_string();
    let mut raw = a.clone();
    raw.extend(block("B cache size 1", "b"));
    write(&fx.raw, &raw);

    let merger = fx.merger();
    merger.merge_one(&fx.raw, &fx.collected).unwrap();
    let first = fx.collected_lines();
    merger.merge_one(&fx.raw, &fx.collected).unwrap();
    let second = fx.collected_lines();

    assert_eq!(first, raw);
    assert_eq!(second, first);
}

#[test]
fn test_kept_fragment_survives_later_merges() {
    let fx = Fixture::new();
    let merger = fx.merger().with_trailing_fragment(TrailingFragment::Keep);

    let a = block("t ALG-A cache size 10", "a");
    let fragment = vec!["t ALG-S cache size 10\n".to_string(), "s-l2\n".to_string()];
    let mut raw = a.clone();
    raw.extend(fragment.clone());
    write(&fx.raw, &raw);
    merger.merge_one(&fx.raw, &fx.collected).unwrap();

    write(&fx.raw, &block("t ALG-B cache size 10", "old-b"));
    merger.merge_one(&fx.raw, &fx.collected).unwrap();

    let new_b = block("t ALG-B cache size 10", "new-b");
    write(&fx.raw, &new_b);
    merger.merge_one(&fx.raw, &fx.collected).unwrap();

    let lines = fx.collected_lines();
    let mut expected = a;
    expected.extend(fragment);
    expected.extend(new_b);
    assert_eq!(lines, expected);
    assert_eq!(lines.iter().filter(|l| l.contains("cache size")).count(), 3);
}
