#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use lcov_commenter::config::{EventTarget, RunConfiguration};
use lcov_commenter::error::{CommenterError, Result};
use lcov_commenter::github::Tracker;
use lcov_commenter::model::{ChangedFile, Comparison, ExistingComment};

/// A call made against the fake tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { page: u32, per_page: u32 },
    Create { pr_number: u64, body: String },
    Update { comment_id: u64, body: String },
    Delete { comment_id: u64 },
    CommitComment { sha: String, body: String },
    Compare { base: String, head: String },
}

/// In-memory tracker that serves a fixed comment list and records calls.
pub struct FakeTracker {
    /// Comments in the order the server would list them.
    pub comments: Vec<ExistingComment>,
    pub failing_deletes: Vec<u64>,
    pub comparison: Comparison,
    pub calls: RefCell<Vec<Call>>,
    next_id: Cell<u64>,
}

impl FakeTracker {
    pub fn new(comments: Vec<ExistingComment>) -> Self {
        Self {
            comments,
            failing_deletes: Vec::new(),
            comparison: Comparison {
                status: 200,
                files: Vec::new(),
            },
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1000),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { comment_id } => Some(comment_id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(*c)).count()
    }

    fn issue_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Tracker for FakeTracker {
    fn list_comments(
        &self,
        _pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ExistingComment>> {
        self.calls.borrow_mut().push(Call::List { page, per_page });
        let start = ((page - 1) * per_page) as usize;
        let end = (start + per_page as usize).min(self.comments.len());
        Ok(self.comments.get(start..end).unwrap_or_default().to_vec())
    }

    fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64> {
        self.calls.borrow_mut().push(Call::Create {
            pr_number,
            body: body.to_string(),
        });
        Ok(self.issue_id())
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        self.calls.borrow_mut().push(Call::Update {
            comment_id,
            body: body.to_string(),
        });
        Ok(())
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        self.calls.borrow_mut().push(Call::Delete { comment_id });
        if self.failing_deletes.contains(&comment_id) {
            return Err(CommenterError::Http {
                operation: "delete comment".to_string(),
                message: "HTTP 403: forbidden".to_string(),
            });
        }
        Ok(())
    }

    fn create_commit_comment(&self, sha: &str, body: &str) -> Result<u64> {
        self.calls.borrow_mut().push(Call::CommitComment {
            sha: sha.to_string(),
            body: body.to_string(),
        });
        Ok(self.issue_id())
    }

    fn compare_commits(&self, base: &str, head: &str) -> Result<Comparison> {
        self.calls.borrow_mut().push(Call::Compare {
            base: base.to_string(),
            head: head.to_string(),
        });
        Ok(self.comparison.clone())
    }
}

/// A comment with an author, updated `age` minutes before a fixed instant.
pub fn comment(id: u64, body: &str, age: i64) -> ExistingComment {
    ExistingComment {
        id,
        author_present: true,
        body: body.to_string(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::minutes(age),
    }
}

/// A prior report comment.
pub fn report_comment(id: u64, age: i64) -> ExistingComment {
    comment(
        id,
        "Coverage for this commit<details><summary>Coverage Report</summary></details>",
        age,
    )
}

pub fn changed(filename: &str, status: &str) -> ChangedFile {
    ChangedFile {
        filename: filename.to_string(),
        status: status.to_string(),
    }
}

pub fn pull_request() -> EventTarget {
    EventTarget::PullRequest {
        number: 42,
        head_sha: "headsha".to_string(),
        base_sha: "basesha".to_string(),
        head_ref: "feature".to_string(),
        base_ref: "main".to_string(),
    }
}

pub fn push(after: Option<&str>, before: Option<&str>) -> EventTarget {
    EventTarget::Push {
        after: after.map(str::to_string),
        before: before.map(str::to_string),
        head_ref: "refs/heads/main".to_string(),
    }
}

pub fn config(target: EventTarget) -> RunConfiguration {
    RunConfiguration {
        repository: "acme/widgets".to_string(),
        prefix: "/work/".to_string(),
        working_dir: PathBuf::from("./"),
        lcov_file: PathBuf::from("coverage/lcov.info"),
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
