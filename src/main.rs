use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::error;

use lcov_commenter::config::{parse_threshold, EventContext, Inputs, RunConfiguration};
use lcov_commenter::github::GitHubClient;
use lcov_commenter::run::run;

/// lcov-commenter: post LCOV coverage, and its change against a baseline,
/// as a pull request or commit comment.
///
/// Every option can also be given through the matching GitHub Actions input
/// variable.
#[derive(Parser)]
#[command(name = "lcov-commenter", version, about)]
struct Cli {
    /// GitHub token used to post comments.
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// LCOV report, relative to the working directory.
    #[arg(long, env = "INPUT_LCOV-FILE")]
    lcov_file: Option<String>,

    /// Baseline LCOV report to compare against.
    #[arg(long, env = "INPUT_LCOV-BASE")]
    lcov_base: Option<String>,

    /// Directory the coverage report was produced in.
    #[arg(long, env = "INPUT_WORKING-DIRECTORY")]
    working_directory: Option<String>,

    /// Only list files changed between the base and head commits.
    #[arg(long, env = "INPUT_FILTER-CHANGED-FILES", action = ArgAction::Set, value_parser = parse_flag, default_value = "false")]
    filter_changed_files: bool,

    /// Delete earlier coverage reports on the pull request.
    #[arg(long, env = "INPUT_DELETE-OLD-COMMENTS", action = ArgAction::Set, value_parser = parse_flag, default_value = "false")]
    delete_old_comments: bool,

    /// Update the latest coverage report instead of posting a new one.
    #[arg(long, env = "INPUT_UPDATE-COMMENT", action = ArgAction::Set, value_parser = parse_flag, default_value = "false")]
    update_comment: bool,

    /// Heading for the report; also used to tell reports apart.
    #[arg(long, env = "INPUT_TITLE")]
    title: Option<String>,

    /// Fail when coverage drops by more than this many percentage points.
    #[arg(long, env = "INPUT_FAIL-DROP-THRESHOLD")]
    fail_drop_threshold: Option<String>,

    /// Comma-separated changed files, instead of asking GitHub.
    #[arg(long, value_delimiter = ',')]
    changed_files: Option<Vec<String>>,
}

/// Action inputs are true only when literally "true", in any case.
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Reject a bad threshold before touching the filesystem or network.
    if let Some(raw) = cli.fail_drop_threshold.as_deref() {
        parse_threshold(raw)?;
    }

    let token = cli
        .github_token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .filter(|t| !t.is_empty())
        .context("a GitHub token is required (--github-token, INPUT_GITHUB-TOKEN or GITHUB_TOKEN)")?;

    let event = EventContext::from_env().context("Failed to read the GitHub event context")?;
    let inputs = Inputs {
        lcov_file: cli.lcov_file,
        lcov_base: cli.lcov_base,
        working_directory: cli.working_directory,
        filter_changed_files: cli.filter_changed_files,
        delete_old_comments: cli.delete_old_comments,
        update_comment: cli.update_comment,
        title: cli.title,
        fail_drop_threshold: cli.fail_drop_threshold,
        changed_files: cli.changed_files,
    };
    let config = RunConfiguration::new(inputs, &event).context("Invalid configuration")?;

    let mut client = GitHubClient::new(token, config.repository.clone());
    if let Ok(api_url) = std::env::var("GITHUB_API_URL") {
        if !api_url.is_empty() {
            client = client.with_api_url(api_url);
        }
    }

    let report = run(&client, &config)
        .with_context(|| format!("Coverage report failed for {} event", config.target.event_name()))?;

    if let Some(message) = report.threshold.failure_message() {
        error!("{message}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
