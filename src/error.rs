// src/error.rs
// =============================================================================
// Typed errors shared by the traversal core, the expanders and the work pool.
//
// None of these are fatal to a traversal: an ExpansionError prunes exactly one
// branch and is reported through the result sink. Only main.rs turns things
// into anyhow errors and exit codes.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

/// Why a node could not be expanded into its content and neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExpansionError {
    /// The data source has no entry for this node
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The expander panicked; caught at the task boundary
    #[error("expander panicked while expanding {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for ExpansionError {
    // Same buckets the link checker used: timeout, redirect loop, connect, other
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ExpansionError::Timeout
        } else if error.is_redirect() {
            ExpansionError::TooManyRedirects
        } else if error.is_connect() {
            ExpansionError::Connect(error.to_string())
        } else if let Some(status) = error.status() {
            ExpansionError::Status(status.as_u16())
        } else {
            ExpansionError::Transport(error.to_string())
        }
    }
}

/// Failures of the bounded work pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("a pool needs at least one worker")]
    NoWorkers,

    #[error("channel capacity must be greater than zero")]
    ZeroCapacity,

    #[error("a pool worker panicked")]
    WorkerPanicked,

    #[error("{requested} work items requested, at most {max} allowed")]
    TooManyItems { requested: u64, max: u64 },
}

/// Failures building a tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// `10 * k` does not fit in an i64
    #[error("k = {0} is too large: 10 * k overflows")]
    Overflow(i64),
}
