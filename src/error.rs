use thiserror::Error;

use crate::records::{SnapshotKind, Table};

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

/// Cause reported by a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }
}

/// Failure of a single round trip to the exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot fetch URL {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected http GET status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("cannot decode JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{url} answered success=false: {message}")]
    Rejected { url: String, message: String },
    #[error("{kind} snapshots are fetched per market, not exchange-wide")]
    MissingMarket { kind: SnapshotKind },
}

#[derive(Debug, Error)]
#[error("existing trade id lookup failed for {candidates} candidates: {source}")]
pub struct LookupError {
    pub candidates: usize,
    #[source]
    pub source: BoxError,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot open {table} batch: {source}")]
    Begin {
        table: Table,
        #[source]
        source: BoxError,
    },
    #[error("cannot append row {index} to {table}, batch rolled back: {source}")]
    Append {
        table: Table,
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("cannot commit {table} batch: {source}")]
    Commit {
        table: Table,
        #[source]
        source: BoxError,
    },
}

/// Everything a per-market ingestion task can fail with. None of it is fatal to the process.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Write(#[from] WriteError),
}
