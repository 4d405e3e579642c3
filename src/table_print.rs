use crate::report::{mean_delta, Curve, DeltaPoint};
use std::fmt::Write;

/// Render rows as a `│`-separated table with a rule under the header
pub fn format_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    write_row(&mut out, header.iter().copied(), &widths);

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    let _ = writeln!(out, "  {}", rule.join("─┼─"));

    for row in rows {
        write_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let cells: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
        .collect();
    let _ = writeln!(out, "  {}", cells.join(" │ "));
}

/// One table per curve: cache size against miss ratio
pub fn format_curves(curves: &[Curve]) -> String {
    let mut out = String::new();
    for curve in curves {
        let _ = writeln!(out, "{} ({} points)", curve.name, curve.points.len());
        let rows: Vec<Vec<String>> = curve
            .points
            .iter()
            .map(|p| vec![p.cache_size.to_string(), format!("{:.4}", p.miss_ratio)])
            .collect();
        out.push_str(&format_table(&["cache size", "miss ratio"], &rows));
        out.push('\n');
    }
    out
}

pub fn format_delta(points: &[DeltaPoint], baseline: &str, candidate: &str) -> String {
    let delta_header = format!("{} - {}", candidate, baseline);
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| {
            vec![
                p.cache_size.to_string(),
                format!("{:.4}", p.baseline),
                format!("{:.4}", p.candidate),
                format!("{:+.4}", p.delta),
            ]
        })
        .collect();

    let mut out = format_table(&["cache size", baseline, candidate, delta_header.as_str()], &rows);
    match mean_delta(points) {
        Some(avg) => {
            let _ = writeln!(out, "  Avg: {:+.4}", avg);
        }
        None => {
            let _ = writeln!(out, "  No cache size has results for both {} and {}", baseline, candidate);
        }
    }
    out
}
