use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommenterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("The base and head commits are missing from the payload for this {event} event.")]
    MissingCommits { event: String },

    #[error(
        "The GitHub API for {operation} for this {event} event returned {status}, expected 200."
    )]
    UnexpectedStatus {
        operation: String,
        event: String,
        status: u16,
    },

    #[error("GitHub API error while trying to {operation}: {message}")]
    Http { operation: String, message: String },
}

pub type Result<T> = std::result::Result<T, CommenterError>;
