//! One run: read the reports, resolve the change set, render, place the
//! comment, then apply the threshold-drop policy.

use std::path::Path;

use log::{info, warn};

use crate::changes::resolve_change_set;
use crate::comments::{place_comment, LifecycleOutcome};
use crate::config::RunConfiguration;
use crate::diff::{check_threshold, diff, DiffResult, ThresholdCheck};
use crate::error::{CommenterError, Result};
use crate::github::Tracker;
use crate::model::CoverageReport;
use crate::parsers::lcov;
use crate::report::render;

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// `None` when there was no coverage report to post.
    pub lifecycle: Option<LifecycleOutcome>,
    pub diff: Option<DiffResult>,
    pub threshold: ThresholdCheck,
}

impl RunReport {
    pub fn no_report() -> Self {
        Self {
            lifecycle: None,
            diff: None,
            threshold: ThresholdCheck::NotConfigured,
        }
    }

    /// True when the threshold-drop policy failed the run.
    pub fn is_failure(&self) -> bool {
        self.threshold.is_failure()
    }
}

/// Read and parse a report. A missing, unreadable or empty file is `None`.
pub fn read_report(path: &Path) -> Result<Option<CoverageReport>> {
    let raw = match std::fs::read(path) {
        Ok(raw) if !raw.is_empty() => raw,
        Ok(_) => return Ok(None),
        Err(e) => {
            info!("Could not read '{}': {e}", path.display());
            return Ok(None);
        }
    };
    lcov::parse(&raw).map(Some).map_err(|e| {
        let message = match e {
            CommenterError::Parse { path: source, message } => format!("{source}: {message}"),
            other => other.to_string(),
        };
        CommenterError::Parse {
            path: path.display().to_string(),
            message,
        }
    })
}

/// Execute a full run against `tracker`.
///
/// Policy failures are reported through [`RunReport::threshold`] after the
/// comment has been placed; hard failures are returned as errors.
pub fn run<T: Tracker + ?Sized>(tracker: &T, config: &RunConfiguration) -> Result<RunReport> {
    let Some(current) = read_report(&config.lcov_file)? else {
        warn!(
            "No coverage report found at '{}', exiting...",
            config.lcov_file.display()
        );
        return Ok(RunReport::no_report());
    };

    let baseline = match &config.baseline_file {
        Some(path) => {
            let baseline = read_report(path)?;
            if baseline.is_none() {
                warn!("No coverage report found at '{}', ignoring...", path.display());
            }
            baseline
        }
        None => None,
    };

    let changed = resolve_change_set(tracker, config)?;

    let body = render(&current, baseline.as_ref(), config, changed.as_deref());
    let lifecycle = place_comment(tracker, config, &body)?;

    let result = diff(&current, baseline.as_ref());
    let threshold = check_threshold(&result, config.fail_drop_threshold);
    if let ThresholdCheck::Skipped { .. } = threshold {
        warn!("No base coverage report provided, cannot check for coverage drop. Skipping this step.");
    }

    Ok(RunReport {
        lifecycle: Some(lifecycle),
        diff: Some(result),
        threshold,
    })
}
