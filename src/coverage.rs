//! Reduction of per-file coverage records into percentages.

use crate::model::{Counts, CoverageReport};

/// Aggregate line coverage percentage for a report.
///
/// `None` means no instrumented lines were found at all.
pub type Aggregate = Option<f64>;

/// Sum lines hit and found across every record and return the percentage.
#[must_use]
pub fn aggregate(report: &CoverageReport) -> Aggregate {
    totals(report).percentage()
}

/// Summed line counts across every record.
#[must_use]
pub fn totals(report: &CoverageReport) -> Counts {
    report.records.iter().map(|r| r.lines).sum()
}

/// Per-file line coverage row.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePercentage<'a> {
    pub path: &'a str,
    pub percentage: Option<f64>,
}

/// Line coverage for each record, in report order.
#[must_use]
pub fn per_file(report: &CoverageReport) -> Vec<FilePercentage<'_>> {
    report
        .records
        .iter()
        .map(|r| FilePercentage {
            path: &r.path,
            percentage: r.lines.percentage(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CoverageRecord;

    fn report(records: &[(&str, u64, u64)]) -> CoverageReport {
        records
            .iter()
            .map(|&(path, hit, found)| CoverageRecord::with_lines(path, hit, found))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_aggregate_sums_across_files() {
        let r = report(&[("a.rs", 30, 40), ("b.rs", 50, 60)]);
        assert_eq!(aggregate(&r), Some(80.0));
    }

    #[test]
    fn test_aggregate_weights_by_lines_not_files() {
        // 1/1 and 0/99 average to 50% per file but 1% per line.
        let r = report(&[("a.rs", 1, 1), ("b.rs", 0, 99)]);
        assert_eq!(aggregate(&r), Some(1.0));
    }

    #[test]
    fn test_aggregate_no_lines_found_is_undefined() {
        assert_eq!(aggregate(&report(&[("a.rs", 0, 0), ("b.rs", 0, 0)])), None);
        assert_eq!(aggregate(&CoverageReport::new()), None);
    }

    #[test]
    fn test_aggregate_stays_in_range() {
        let cases = [
            report(&[("a.rs", 0, 10)]),
            report(&[("a.rs", 10, 10)]),
            report(&[("a.rs", 3, 7), ("b.rs", 0, 0), ("c.rs", 11, 13)]),
        ];
        for r in &cases {
            let pct = aggregate(r).unwrap();
            assert!((0.0..=100.0).contains(&pct), "{pct} out of range");
        }
    }

    #[test]
    fn test_per_file() {
        let r = report(&[("a.rs", 1, 4), ("b.rs", 0, 0)]);
        let rows = per_file(&r);
        assert_eq!(rows[0].path, "a.rs");
        assert_eq!(rows[0].percentage, Some(25.0));
        assert_eq!(rows[1].percentage, None);
    }
}
