//! Run configuration, built once at startup from action inputs and the
//! GitHub Actions event context, and read-only afterwards.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::error::{CommenterError, Result};

const DEFAULT_LCOV_FILE: &str = "./coverage/lcov.info";
const DEFAULT_WORKING_DIR: &str = "./";

/// Where the report comment goes. Pull requests get an issue comment that
/// may be reused; pushes get a fresh commit comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    PullRequest {
        number: u64,
        head_sha: String,
        base_sha: String,
        head_ref: String,
        base_ref: String,
    },
    Push {
        /// Commit the push ended at.
        after: Option<String>,
        /// Commit the push started from.
        before: Option<String>,
        head_ref: String,
    },
    Other {
        event_name: String,
    },
}

impl EventTarget {
    pub fn event_name(&self) -> &str {
        match self {
            EventTarget::PullRequest { .. } => "pull_request",
            EventTarget::Push { .. } => "push",
            EventTarget::Other { event_name } => event_name,
        }
    }

    pub fn head_commit(&self) -> Option<&str> {
        match self {
            EventTarget::PullRequest { head_sha, .. } => Some(head_sha),
            EventTarget::Push { after, .. } => after.as_deref(),
            EventTarget::Other { .. } => None,
        }
    }

    pub fn base_commit(&self) -> Option<&str> {
        match self {
            EventTarget::PullRequest { base_sha, .. } => Some(base_sha),
            EventTarget::Push { before, .. } => before.as_deref(),
            EventTarget::Other { .. } => None,
        }
    }

    /// Branch (or ref) being reported on.
    pub fn head_name(&self) -> Option<&str> {
        match self {
            EventTarget::PullRequest { head_ref, .. } | EventTarget::Push { head_ref, .. } => {
                Some(head_ref)
            }
            EventTarget::Other { .. } => None,
        }
    }

    /// Branch being merged into. Only pull requests have one.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            EventTarget::PullRequest { base_ref, .. } => Some(base_ref),
            _ => None,
        }
    }
}

/// Raw action inputs, as read from the command line or `INPUT_*` variables.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub lcov_file: Option<String>,
    pub lcov_base: Option<String>,
    pub working_directory: Option<String>,
    pub filter_changed_files: bool,
    pub delete_old_comments: bool,
    pub update_comment: bool,
    pub title: Option<String>,
    pub fail_drop_threshold: Option<String>,
    pub changed_files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub repository: Option<PayloadRepository>,
    #[serde(default)]
    pub pull_request: Option<PayloadPullRequest>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadRepository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadPullRequest {
    pub number: u64,
    pub head: PayloadRef,
    pub base: PayloadRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// The GitHub Actions event context for this run.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub event_name: String,
    pub payload: EventPayload,
    pub github_ref: Option<String>,
    pub repository: Option<String>,
    pub workspace: Option<String>,
}

impl EventContext {
    /// Read `GITHUB_EVENT_NAME`, `GITHUB_EVENT_PATH`, `GITHUB_REF`,
    /// `GITHUB_REPOSITORY` and `GITHUB_WORKSPACE`.
    pub fn from_env() -> Result<Self> {
        let event_name = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();
        let payload = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => {
                let raw = std::fs::read_to_string(&path)?;
                serde_json::from_str(&raw)?
            }
            _ => EventPayload::default(),
        };
        Ok(Self {
            event_name,
            payload,
            github_ref: non_empty_var("GITHUB_REF"),
            repository: non_empty_var("GITHUB_REPOSITORY"),
            workspace: non_empty_var("GITHUB_WORKSPACE"),
        })
    }

    fn target(&self) -> Result<EventTarget> {
        match self.event_name.as_str() {
            "pull_request" | "pull_request_target" => {
                let pr = self.payload.pull_request.as_ref().ok_or_else(|| {
                    CommenterError::Config(format!(
                        "{} event payload has no pull_request",
                        self.event_name
                    ))
                })?;
                Ok(EventTarget::PullRequest {
                    number: pr.number,
                    head_sha: pr.head.sha.clone(),
                    base_sha: pr.base.sha.clone(),
                    head_ref: pr.head.ref_name.clone(),
                    base_ref: pr.base.ref_name.clone(),
                })
            }
            "push" => Ok(EventTarget::Push {
                after: self.payload.after.clone().filter(|s| !s.is_empty()),
                before: self.payload.before.clone().filter(|s| !s.is_empty()),
                head_ref: self.github_ref.clone().unwrap_or_default(),
            }),
            other => Ok(EventTarget::Other {
                event_name: other.to_string(),
            }),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Everything a run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// `owner/repo`.
    pub repository: String,
    /// Workspace path prefix stripped from report paths, with a trailing `/`.
    pub prefix: String,
    pub working_dir: PathBuf,
    pub lcov_file: PathBuf,
    pub baseline_file: Option<PathBuf>,
    pub target: EventTarget,
    pub title: Option<String>,
    pub filter_changed_files: bool,
    pub delete_old_comments: bool,
    pub update_comment: bool,
    pub fail_drop_threshold: Option<f64>,
    pub changed_files: Option<Vec<String>>,
}

impl RunConfiguration {
    /// Validate inputs and resolve them against the event context. Performs
    /// no I/O, so invalid inputs fail before any file or network access.
    pub fn new(inputs: Inputs, event: &EventContext) -> Result<Self> {
        let fail_drop_threshold = match inputs.fail_drop_threshold.as_deref() {
            Some(raw) => parse_threshold(raw)?,
            None => None,
        };

        let repository = event
            .payload
            .repository
            .as_ref()
            .map(|r| r.full_name.clone())
            .or_else(|| event.repository.clone())
            .ok_or_else(|| {
                CommenterError::Config("could not determine the repository name".to_string())
            })?;

        let prefix = event
            .workspace
            .as_deref()
            .map(|w| normalise_path(&format!("{}/", w.trim_end_matches(['/', '\\']))))
            .unwrap_or_default();

        let working_dir = PathBuf::from(
            non_blank(inputs.working_directory).unwrap_or_else(|| DEFAULT_WORKING_DIR.to_string()),
        );
        let lcov_file = working_dir.join(
            non_blank(inputs.lcov_file).unwrap_or_else(|| DEFAULT_LCOV_FILE.to_string()),
        );

        Ok(Self {
            repository,
            prefix,
            working_dir,
            lcov_file,
            baseline_file: non_blank(inputs.lcov_base).map(PathBuf::from),
            target: event.target()?,
            title: non_blank(inputs.title),
            filter_changed_files: inputs.filter_changed_files,
            delete_old_comments: inputs.delete_old_comments,
            update_comment: inputs.update_comment,
            fail_drop_threshold,
            changed_files: inputs.changed_files,
        })
    }

    /// Path of a report entry relative to the repository root.
    ///
    /// Paths under the workspace have the workspace prefix stripped. Other
    /// relative paths are taken to be relative to the working directory.
    pub fn repo_path(&self, path: &str) -> String {
        let path = normalise_path(path);
        if !self.prefix.is_empty() {
            if let Some(rest) = path.strip_prefix(&self.prefix) {
                return rest.to_string();
            }
        }
        if path.starts_with('/') {
            return path;
        }
        match working_dir_prefix(&self.working_dir) {
            Some(dir) => format!("{dir}/{path}"),
            None => path,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Normalised working directory without `./` or trailing slashes, or `None`
/// when it is the repository root.
fn working_dir_prefix(dir: &Path) -> Option<String> {
    let dir = normalise_path(&dir.to_string_lossy());
    let mut dir = dir.as_str();
    while let Some(rest) = dir.strip_prefix("./") {
        dir = rest;
    }
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        None
    } else {
        Some(dir.to_string())
    }
}

/// Use forward slashes everywhere.
pub fn normalise_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Parse the fail-drop threshold. Like a lenient float parse, the longest
/// numeric prefix is used ("2.5%" is 2.5). Blank means no threshold.
pub fn parse_threshold(raw: &str) -> Result<Option<f64>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let invalid = || {
        CommenterError::Config(format!(
            "Invalid parameter for fail-drop-threshold: '{raw}'. Must be a number."
        ))
    };
    let re = Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)")
        .map_err(|e| CommenterError::Config(e.to_string()))?;
    let number = re
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(invalid)?;
    let value: f64 = number.as_str().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(CommenterError::Config(format!(
            "Invalid parameter for fail-drop-threshold: '{raw}'. Must be a non-negative number."
        )));
    }
    Ok(Some(value))
}
