//! Files touched between the base and head commits, used to restrict the
//! per-file breakdown.

use crate::config::{normalise_path, RunConfiguration};
use crate::error::{CommenterError, Result};
use crate::github::Tracker;

/// Repository paths added or modified between the base and head commits.
/// Renames and removals are left out.
pub fn changed_files<T: Tracker + ?Sized>(
    tracker: &T,
    config: &RunConfiguration,
) -> Result<Vec<String>> {
    let event = config.target.event_name();
    let (Some(head), Some(base)) = (config.target.head_commit(), config.target.base_commit())
    else {
        return Err(CommenterError::MissingCommits {
            event: event.to_string(),
        });
    };

    let comparison = tracker.compare_commits(base, head)?;
    if comparison.status != 200 {
        return Err(CommenterError::UnexpectedStatus {
            operation: "comparing the base and head commits".to_string(),
            event: event.to_string(),
            status: comparison.status,
        });
    }

    Ok(comparison
        .files
        .into_iter()
        .filter(|f| f.status == "added" || f.status == "modified")
        .map(|f| f.filename)
        .collect())
}

/// The change set to filter on, or `None` when filtering is off. An explicit
/// list in the configuration takes precedence over comparing commits.
pub fn resolve_change_set<T: Tracker + ?Sized>(
    tracker: &T,
    config: &RunConfiguration,
) -> Result<Option<Vec<String>>> {
    if !config.filter_changed_files {
        return Ok(None);
    }
    match &config.changed_files {
        Some(files) => Ok(Some(files.iter().map(|f| normalise_path(f)).collect())),
        None => changed_files(tracker, config).map(Some),
    }
}
