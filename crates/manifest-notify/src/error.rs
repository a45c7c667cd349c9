use thiserror::Error;

/// Failures of a notifier run. Every variant is fatal; nothing is retried.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Reading latest commit message failed: {0}")]
    VersionControl(String),

    #[error("Authentication against the chat backend failed: {0}")]
    Auth(String),

    #[error("Network error talking to the chat backend: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Chat backend rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, NotifyError>;
