//! Per-file breakdown table for the collapsible section of the report.

use std::collections::BTreeMap;

use crate::config::RunConfiguration;
use crate::html::{a, b, fragment, table, tag, tbody, td, th, tr};
use crate::model::{Counts, CoverageRecord, CoverageReport};

const COLUMNS: [&str; 6] = [
    "File",
    "Stmts",
    "Branches",
    "Funcs",
    "Lines",
    "Uncovered Lines",
];

/// Render the per-file table. When `changed` is given only files whose
/// repository path is listed are included.
pub fn tabulate(
    report: &CoverageReport,
    config: &RunConfiguration,
    changed: Option<&[String]>,
) -> String {
    let head_cells: Vec<String> = COLUMNS.iter().map(|c| th(c)).collect();
    let head = tr(&head_cells.iter().map(String::as_str).collect::<Vec<_>>());

    // folder -> files in report order; folders sorted
    let mut folders: BTreeMap<String, Vec<(String, &CoverageRecord)>> = BTreeMap::new();
    for record in &report.records {
        let path = config.repo_path(&record.path);
        if let Some(changed) = changed {
            if !changed.iter().any(|c| *c == path) {
                continue;
            }
        }
        let folder = match path.rsplit_once('/') {
            Some((folder, _)) => folder.to_string(),
            None => String::new(),
        };
        folders.entry(folder).or_default().push((path, record));
    }

    let commit = config.target.head_commit().unwrap_or("HEAD");
    let mut rows = vec![head];
    for (folder, files) in &folders {
        let indent = !folder.is_empty();
        if indent {
            rows.push(tr(&[&tag("td", &[("colspan", "6")], &[&b(folder)])]));
        }
        for (path, record) in files {
            rows.push(file_row(record, path, indent, &config.repository, commit));
        }
    }

    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    table(&[&tbody(&rows)])
}

fn file_row(
    record: &CoverageRecord,
    path: &str,
    indent: bool,
    repository: &str,
    commit: &str,
) -> String {
    let href = format!("https://github.com/{repository}/blob/{commit}/{path}");
    let name = path.rsplit('/').next().unwrap_or(path);
    let space = if indent { "&nbsp; &nbsp;" } else { "" };

    let cells = [
        td(&fragment(&[space, &a(&href, name)])),
        td(&percentage_cell(record.statements())),
        td(&percentage_cell(record.branches)),
        td(&percentage_cell(record.functions)),
        td(&percentage_cell(record.lines)),
        td(&uncovered_cell(&record.uncovered_lines(), &href)),
    ];
    tr(&cells.iter().map(String::as_str).collect::<Vec<_>>())
}

/// "N/A" when nothing was found, otherwise the percentage with a trailing
/// ".00" dropped. Anything short of 100% is bold.
fn percentage_cell(counts: Counts) -> String {
    let Some(value) = counts.percentage() else {
        return "N/A".to_string();
    };
    let formatted = format!("{value:.2}");
    let rounded = match formatted.strip_suffix(".00") {
        Some(whole) => whole,
        None => formatted.as_str(),
    };
    if counts.hit == counts.found {
        format!("{rounded}%")
    } else {
        b(&format!("{rounded}%"))
    }
}

fn uncovered_cell(lines: &[u32], href: &str) -> String {
    coalesce(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                a(&format!("{href}#L{start}"), &start.to_string())
            } else {
                a(
                    &format!("{href}#L{start}-L{end}"),
                    &format!("{start}&ndash;{end}"),
                )
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merge sorted, deduplicated line numbers into consecutive `(start, end)`
/// ranges.
#[must_use]
pub fn coalesce(lines: &[u32]) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == line => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
}
