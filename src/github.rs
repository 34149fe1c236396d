//! GitHub REST API access for listing, posting and deleting report comments
//! and for comparing commits.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::{CommenterError, Result};
use crate::model::{ChangedFile, Comparison, ExistingComment};

const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "lcov-commenter";

/// The comment-tracker operations a run depends on. Every call is attempted
/// exactly once.
pub trait Tracker {
    /// One page of comments on a pull request, most recently updated first.
    /// Pages are numbered from 1.
    fn list_comments(&self, pr_number: u64, page: u32, per_page: u32)
        -> Result<Vec<ExistingComment>>;

    /// Post a new comment on a pull request and return its id.
    fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64>;

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;

    fn delete_comment(&self, comment_id: u64) -> Result<()>;

    /// Post a comment on a commit and return its id.
    fn create_commit_comment(&self, sha: &str, body: &str) -> Result<u64>;

    /// Compare two commits. Any HTTP response is returned with its status;
    /// only transport failures are errors.
    fn compare_commits(&self, base: &str, head: &str) -> Result<Comparison>;
}

/// Blocking GitHub client authenticated with a token.
pub struct GitHubClient {
    agent: ureq::Agent,
    token: String,
    repo: String,
    api_url: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            token: token.into(),
            repo: repo.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at another API root, e.g. GitHub Enterprise.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo, path)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[derive(Deserialize)]
struct ApiComment {
    id: u64,
    user: Option<IgnoredAny>,
    body: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ApiComment> for ExistingComment {
    fn from(c: ApiComment) -> Self {
        ExistingComment {
            id: c.id,
            author_present: c.user.is_some(),
            body: c.body.unwrap_or_default(),
            updated_at: c.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct CreatedComment {
    id: u64,
}

#[derive(Deserialize)]
struct ApiComparison {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

/// Turn a ureq failure into a descriptive error for `operation`.
fn http_error(operation: &str, err: ureq::Error) -> CommenterError {
    let message = match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            format!("HTTP {code}: {body}")
        }
        ureq::Error::Transport(t) => t.to_string(),
    };
    CommenterError::Http {
        operation: operation.to_string(),
        message,
    }
}

fn decode_error(operation: &str, err: std::io::Error) -> CommenterError {
    CommenterError::Http {
        operation: operation.to_string(),
        message: format!("could not decode response: {err}"),
    }
}

impl Tracker for GitHubClient {
    fn list_comments(
        &self,
        pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ExistingComment>> {
        let op = "list pull request comments";
        let url = self.url(&format!("issues/{pr_number}/comments"));
        let comments: Vec<ApiComment> = self
            .request("GET", &url)
            .query("per_page", &per_page.to_string())
            .query("page", &page.to_string())
            .query("sort", "updated")
            .query("direction", "desc")
            .call()
            .map_err(|e| http_error(op, e))?
            .into_json()
            .map_err(|e| decode_error(op, e))?;
        Ok(comments.into_iter().map(ExistingComment::from).collect())
    }

    fn create_comment(&self, pr_number: u64, body: &str) -> Result<u64> {
        let op = "create comment";
        let url = self.url(&format!("issues/{pr_number}/comments"));
        let created: CreatedComment = self
            .request("POST", &url)
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| http_error(op, e))?
            .into_json()
            .map_err(|e| decode_error(op, e))?;
        Ok(created.id)
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let url = self.url(&format!("issues/comments/{comment_id}"));
        self.request("PATCH", &url)
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| http_error("update comment", e))?;
        Ok(())
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        let url = self.url(&format!("issues/comments/{comment_id}"));
        self.request("DELETE", &url)
            .call()
            .map_err(|e| http_error("delete comment", e))?;
        Ok(())
    }

    fn create_commit_comment(&self, sha: &str, body: &str) -> Result<u64> {
        let op = "create commit comment";
        let url = self.url(&format!("commits/{sha}/comments"));
        let created: CreatedComment = self
            .request("POST", &url)
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| http_error(op, e))?
            .into_json()
            .map_err(|e| decode_error(op, e))?;
        Ok(created.id)
    }

    fn compare_commits(&self, base: &str, head: &str) -> Result<Comparison> {
        let op = "compare commits";
        let url = self.url(&format!("compare/{base}...{head}"));
        let resp = match self.request("GET", &url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, _)) => {
                return Ok(Comparison {
                    status,
                    files: Vec::new(),
                })
            }
            Err(e) => return Err(http_error(op, e)),
        };
        let status = resp.status();
        let comparison: ApiComparison = resp.into_json().map_err(|e| decode_error(op, e))?;
        Ok(Comparison {
            status,
            files: comparison.files,
        })
    }
}
