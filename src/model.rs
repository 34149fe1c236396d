//! Uniform in-memory representation of coverage data and of the report
//! comments already attached to a change request. Parsers produce a
//! `CoverageReport` which is then reduced, diffed and rendered.

use chrono::{DateTime, Utc};

/// Compute a coverage percentage (0–100), or `None` when nothing was found.
///
/// A report with no instrumented lines has no measurable coverage; it is
/// neither 0% nor 100%, so callers have to decide how to present it.
#[must_use]
pub fn percentage(hit: u64, found: u64) -> Option<f64> {
    if found == 0 {
        None
    } else {
        Some(hit as f64 * 100.0 / found as f64)
    }
}

/// A hit/found pair for one coverage category (lines, branches, functions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub hit: u64,
    pub found: u64,
}

impl Counts {
    pub fn new(hit: u64, found: u64) -> Self {
        Self { hit, found }
    }

    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        percentage(self.hit, self.found)
    }
}

impl std::ops::Add for Counts {
    type Output = Counts;

    fn add(self, other: Counts) -> Counts {
        Counts {
            hit: self.hit + other.hit,
            found: self.found + other.found,
        }
    }
}

impl std::iter::Sum for Counts {
    fn sum<I: Iterator<Item = Counts>>(iter: I) -> Counts {
        iter.fold(Counts::default(), |acc, c| acc + c)
    }
}

/// A single instrumentable line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDetail {
    pub line_number: u32,
    pub hit_count: u64,
}

/// A single branch arm on a given line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDetail {
    pub line_number: u32,
    pub block: u32,
    pub branch: u32,
    pub taken: u64,
}

/// A function/method that was instrumentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDetail {
    pub name: String,
    pub start_line: Option<u32>,
    pub hit_count: u64,
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageRecord {
    pub path: String,
    pub lines: Counts,
    pub branches: Counts,
    pub functions: Counts,
    pub line_details: Vec<LineDetail>,
    pub branch_details: Vec<BranchDetail>,
    pub function_details: Vec<FunctionDetail>,
}

impl CoverageRecord {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Build a record from line counts alone.
    pub fn with_lines(path: impl Into<String>, hit: u64, found: u64) -> Self {
        Self {
            path: path.into(),
            lines: Counts::new(hit, found),
            ..Default::default()
        }
    }

    /// Lines, branches and functions summed together.
    #[must_use]
    pub fn statements(&self) -> Counts {
        self.lines + self.branches + self.functions
    }

    /// Sorted, deduplicated line numbers with a zero-hit line or an
    /// untaken branch.
    #[must_use]
    pub fn uncovered_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .branch_details
            .iter()
            .filter(|b| b.taken == 0)
            .map(|b| b.line_number)
            .chain(
                self.line_details
                    .iter()
                    .filter(|l| l.hit_count == 0)
                    .map(|l| l.line_number),
            )
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

/// The complete result of parsing a single LCOV file, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub records: Vec<CoverageRecord>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<CoverageRecord>> for CoverageReport {
    fn from(records: Vec<CoverageRecord>) -> Self {
        Self { records }
    }
}

/// A comment already present on the change request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingComment {
    pub id: u64,
    /// Whether the tracker reported an author for the comment. Comments
    /// from deleted accounts come back without one.
    pub author_present: bool,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

/// A file entry returned by a commit comparison.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
}

/// Result of comparing two commits. The HTTP status is kept so the caller
/// decides which statuses are acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub status: u16,
    pub files: Vec<ChangedFile>,
}
