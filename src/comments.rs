//! Report comment lifecycle: find earlier reports on a pull request, clean
//! up superseded ones, and create or update the current one.

use log::{debug, info, warn};

use crate::config::{EventTarget, RunConfiguration};
use crate::error::{CommenterError, Result};
use crate::github::Tracker;
use crate::model::ExistingComment;
use crate::report::REPORT_MARKER;

/// Page size used when listing comments.
pub const COMMENTS_PER_PAGE: u32 = 20;

/// Whether a comment looks like a report posted by an earlier run.
pub fn is_report_comment(comment: &ExistingComment, title: Option<&str>) -> bool {
    comment.author_present
        && title.map_or(true, |t| comment.body.contains(t))
        && comment.body.contains(REPORT_MARKER)
}

/// All earlier report comments on the pull request, in retrieval order
/// (most recently updated first).
pub fn list_matching<T: Tracker + ?Sized>(
    tracker: &T,
    pr_number: u64,
    config: &RunConfiguration,
) -> Result<Vec<ExistingComment>> {
    let mut results = Vec::new();
    let mut page = 1;
    loop {
        let batch = tracker.list_comments(pr_number, page, COMMENTS_PER_PAGE)?;
        let last_page = batch.len() < COMMENTS_PER_PAGE as usize;
        results.extend(batch);
        if last_page {
            break;
        }
        page += 1;
    }

    let title = config.title.as_deref();
    Ok(results
        .into_iter()
        .filter(|c| is_report_comment(c, title))
        .collect())
}

/// Matches split into the comment to reuse and the comments to delete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciled {
    pub reuse: Option<ExistingComment>,
    pub stale: Vec<ExistingComment>,
}

/// With `keep_newest` the first match is held back for reuse and the rest
/// are stale; otherwise every match is stale.
pub fn reconcile(matches: Vec<ExistingComment>, keep_newest: bool) -> Reconciled {
    let mut matches = matches.into_iter();
    let reuse = if keep_newest { matches.next() } else { None };
    Reconciled {
        reuse,
        stale: matches.collect(),
    }
}

/// Ids of comments removed, and of those that could not be.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deletions {
    pub deleted: Vec<u64>,
    pub failed: Vec<u64>,
}

/// Best-effort removal: a failure is logged and the rest are still tried.
pub fn delete_stale<T: Tracker + ?Sized>(tracker: &T, stale: &[ExistingComment]) -> Deletions {
    let mut out = Deletions::default();
    for comment in stale {
        debug!("Deleting comment: {}", comment.id);
        match tracker.delete_comment(comment.id) {
            Ok(()) => out.deleted.push(comment.id),
            Err(e) => {
                warn!("Failed to delete comment {}: {e}", comment.id);
                out.failed.push(comment.id);
            }
        }
    }
    out
}

/// Where the report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Created { comment_id: u64 },
    Updated { comment_id: u64 },
    CommitComment { sha: String, comment_id: u64 },
    /// The event has no comment target.
    Skipped { event_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    pub placement: Placement,
    pub deletions: Deletions,
}

/// Post `body` according to the configured delete/update policy.
pub fn place_comment<T: Tracker + ?Sized>(
    tracker: &T,
    config: &RunConfiguration,
    body: &str,
) -> Result<LifecycleOutcome> {
    match &config.target {
        EventTarget::PullRequest { number, .. } => place_on_pull_request(tracker, config, *number, body),
        EventTarget::Push { after, .. } => {
            let sha = after.as_deref().ok_or_else(|| CommenterError::MissingCommits {
                event: config.target.event_name().to_string(),
            })?;
            let comment_id = tracker.create_commit_comment(sha, body)?;
            info!("Posted coverage report on commit {sha}");
            Ok(LifecycleOutcome {
                placement: Placement::CommitComment {
                    sha: sha.to_string(),
                    comment_id,
                },
                deletions: Deletions::default(),
            })
        }
        EventTarget::Other { event_name } => {
            info!("No comment target for {event_name} events, skipping");
            Ok(LifecycleOutcome {
                placement: Placement::Skipped {
                    event_name: event_name.clone(),
                },
                deletions: Deletions::default(),
            })
        }
    }
}

fn place_on_pull_request<T: Tracker + ?Sized>(
    tracker: &T,
    config: &RunConfiguration,
    pr_number: u64,
    body: &str,
) -> Result<LifecycleOutcome> {
    let mut deletions = Deletions::default();
    let target = if config.delete_old_comments {
        let matches = list_matching(tracker, pr_number, config)?;
        let reconciled = reconcile(matches, config.update_comment);
        deletions = delete_stale(tracker, &reconciled.stale);
        reconciled.reuse
    } else if config.update_comment {
        list_matching(tracker, pr_number, config)?.into_iter().next()
    } else {
        None
    };

    let placement = match target {
        Some(existing) => {
            tracker.update_comment(existing.id, body)?;
            info!("Updated coverage report comment {} on #{pr_number}", existing.id);
            Placement::Updated {
                comment_id: existing.id,
            }
        }
        None => {
            let comment_id = tracker.create_comment(pr_number, body)?;
            info!("Posted coverage report comment {comment_id} on #{pr_number}");
            Placement::Created { comment_id }
        }
    };

    Ok(LifecycleOutcome {
        placement,
        deletions,
    })
}
