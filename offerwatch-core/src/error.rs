use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(StatusCode),
    #[error("malformed feed body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("feed body has no `data` array")]
    MissingData,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("message rejected ({status}): {description}")]
    Rejected {
        status: StatusCode,
        description: String,
    },
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("at least one postal code is required")]
    EmptyFilters,
    #[error("watch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("filter store error: {0}")]
    Store(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
