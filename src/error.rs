//! Centralized error types for term-dx
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Failure modes of a single kubectl query.
///
/// Every variant folds to an absent result at the gateway boundary; the
/// typed detail is kept for debug logging only, so a failed query can be
/// told apart in the logs (cluster unreachable vs. unknown kind vs. bad
/// JSON) even though callers only see `None`.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("query timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("kubectl exited with {code}: {stderr}")]
    NonZeroExit { code: String, stderr: String },

    #[error("kubectl produced no output")]
    EmptyOutput,

    #[error("invalid JSON from kubectl: {0}")]
    Json(#[from] serde_json::Error),
}
