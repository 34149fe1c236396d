//! Rendering of the coverage report comment body.
//!
//! The output depends only on its inputs, so identical runs produce
//! byte-identical bodies.

use crate::config::RunConfiguration;
use crate::coverage::Aggregate;
use crate::diff::{check_threshold, diff, DiffResult, ThresholdCheck};
use crate::html::{b, details, fragment, h2, summary, table, tbody, th, tr};
use crate::model::CoverageReport;
use crate::tabulate::tabulate;

/// Hard ceiling on comment body length, in characters.
pub const MAX_COMMENT_CHARS: usize = 65536;

/// Substring present in every rendered report, used to recognise earlier
/// reports among a change request's comments.
pub const REPORT_MARKER: &str = "Coverage Report";

/// Render the full comment body, truncated to [`MAX_COMMENT_CHARS`].
///
/// `changed` restricts the per-file table to the given repository paths.
pub fn render(
    current: &CoverageReport,
    baseline: Option<&CoverageReport>,
    config: &RunConfiguration,
    changed: Option<&[String]>,
) -> String {
    let result = diff(current, baseline);
    let check = check_threshold(&result, config.fail_drop_threshold);

    let title = config.title.as_deref().map(h2).unwrap_or_default();
    let headline = headline(config);
    let summary_table = summary_table(&result);
    let warning = match check {
        ThresholdCheck::Failed { threshold, .. } => b(&format!(
            "Failing due to coverage drop of more than {threshold}%"
        )),
        _ => String::new(),
    };
    let label = if changed.is_some() {
        format!("{REPORT_MARKER} for Changed Files")
    } else {
        REPORT_MARKER.to_string()
    };
    let breakdown = details(&[&summary(&label), &tabulate(current, config, changed)]);

    let body = fragment(&[
        &title,
        &headline,
        &summary_table,
        &warning,
        "\n\n",
        &breakdown,
    ]);
    truncate_chars(body, MAX_COMMENT_CHARS)
}

fn headline(config: &RunConfiguration) -> String {
    match (config.target.head_name(), config.target.base_name()) {
        (Some(head), Some(base)) => format!(
            "Coverage after merging {} into {} will be",
            b(head),
            b(base)
        ),
        _ => "Coverage for this commit".to_string(),
    }
}

fn summary_table(result: &DiffResult) -> String {
    let mut rows = vec![tr(&[&th(&format_aggregate(result.after))])];
    if result.has_baseline() {
        rows.push(tr(&[&th(&format_delta(result))]));
    }
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    table(&[&tbody(&rows)])
}

/// Two decimals and a `%`, or "N/A" when there is nothing to measure.
pub fn format_aggregate(value: Aggregate) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "N/A".to_string(),
    }
}

/// Direction glyph followed by the signed delta.
pub fn format_delta(result: &DiffResult) -> String {
    let Some(delta) = result.delta else {
        return "N/A".to_string();
    };
    let sign = if delta > 0.0 { "+" } else { "" };
    let glyph = result.direction.glyph();
    if glyph.is_empty() {
        format!("{sign}{delta:.2}%")
    } else {
        format!("{glyph} {sign}{delta:.2}%")
    }
}

/// Cut `s` to at most `max` characters, on a character boundary.
pub fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventTarget;
    use crate::model::CoverageRecord;
    use std::path::PathBuf;

    fn config(target: EventTarget) -> RunConfiguration {
        RunConfiguration {
            repository: "acme/widgets".to_string(),
            prefix: String::new(),
            working_dir: PathBuf::from("./"),
            lcov_file: PathBuf::from("lcov.info"),
            baseline_file: None,
            target,
            title: None,
            filter_changed_files: false,
            delete_old_comments: false,
            update_comment: false,
            fail_drop_threshold: None,
            changed_files: None,
        }
    }

    fn pull_request() -> EventTarget {
        EventTarget::PullRequest {
            number: 3,
            head_sha: "abc".to_string(),
            base_sha: "def".to_string(),
            head_ref: "feature".to_string(),
            base_ref: "main".to_string(),
        }
    }

    fn lines(hit: u64, found: u64) -> CoverageReport {
        vec![CoverageRecord::with_lines("src/lib.rs", hit, found)].into()
    }

    #[test]
    fn test_render_without_baseline() {
        let body = render(&lines(80, 100), None, &config(pull_request()), None);
        assert!(body.starts_with("Coverage after merging <b>feature</b> into <b>main</b> will be"));
        assert!(body.contains("<table><tbody><tr><th>80.00%</th></tr></tbody></table>"));
        assert!(body.contains("<summary>Coverage Report</summary>"));
        assert!(!body.contains("<h2>"));
    }

    #[test]
    fn test_render_with_baseline() {
        let body = render(
            &lines(80, 100),
            Some(&lines(70, 100)),
            &config(pull_request()),
            None,
        );
        assert!(body.contains("<tr><th>80.00%</th></tr><tr><th>▴ +10.00%</th></tr>"));
    }

    #[test]
    fn test_render_push_headline_and_title() {
        let mut cfg = config(EventTarget::Push {
            after: Some("aaa".to_string()),
            before: None,
            head_ref: "refs/heads/main".to_string(),
        });
        cfg.title = Some("Unit tests".to_string());
        let body = render(&lines(1, 2), None, &cfg, None);
        assert!(body.starts_with("<h2>Unit tests</h2>Coverage for this commit"));
    }

    #[test]
    fn test_render_threshold_warning() {
        let mut cfg = config(pull_request());
        cfg.fail_drop_threshold = Some(5.0);

        let dropped = render(&lines(60, 100), Some(&lines(70, 100)), &cfg, None);
        assert!(dropped.contains("<b>Failing due to coverage drop of more than 5%</b>"));
        assert!(dropped.contains("▾ -10.00%"));

        let fine = render(&lines(68, 100), Some(&lines(70, 100)), &cfg, None);
        assert!(!fine.contains("Failing"));
    }

    #[test]
    fn test_render_changed_files_label() {
        let changed = vec!["src/lib.rs".to_string()];
        let body = render(&lines(1, 2), None, &config(pull_request()), Some(&changed));
        assert!(body.contains("<summary>Coverage Report for Changed Files</summary>"));
    }

    #[test]
    fn test_render_no_measurable_coverage() {
        let body = render(&lines(0, 0), Some(&lines(1, 2)), &config(pull_request()), None);
        assert!(body.contains("<th>N/A</th></tr><tr><th>N/A</th>"));
        assert!(!body.contains("NaN"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let cfg = config(pull_request());
        let a = render(&lines(3, 7), Some(&lines(2, 7)), &cfg, None);
        let b = render(&lines(3, 7), Some(&lines(2, 7)), &cfg, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_truncates_large_tables() {
        let records: Vec<CoverageRecord> = (0..5000)
            .map(|i| CoverageRecord::with_lines(format!("src/module_{i}/file_{i}.rs"), 1, 3))
            .collect();
        let body = render(&records.into(), None, &config(pull_request()), None);
        assert_eq!(body.chars().count(), MAX_COMMENT_CHARS);
        assert!(body.contains(REPORT_MARKER));
    }

    #[test]
    fn test_format_delta() {
        let flat = diff(&lines(1, 2), Some(&lines(1, 2)));
        assert_eq!(format_delta(&flat), "0.00%");
        let down = diff(&lines(1, 4), Some(&lines(1, 2)));
        assert_eq!(format_delta(&down), "▾ -25.00%");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("▴▴▴".to_string(), 2), "▴▴");
        assert_eq!(truncate_chars("abc".to_string(), 10), "abc");
    }
}
