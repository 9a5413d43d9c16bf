//! Error types.
//!
//! Tracking and triggering are infallible in-memory graph operations. The
//! only failures in this crate come from the host object model (writing a
//! read-only or frozen [`Record`](crate::Record)) and from loading records
//! out of JSON.

use thiserror::Error;

/// Errors surfaced by reactive writes and record loading.
#[derive(Debug, Error)]
pub enum Error {
    /// The property was defined read-only on its record.
    #[error("cannot assign to read-only property `{key}`")]
    ReadOnly { key: String },

    /// The record is frozen: no key may be added, changed or removed.
    #[error("cannot modify property `{key}` of a frozen record")]
    Frozen { key: String },

    /// The input was not valid JSON.
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document parsed, but its top level is not an object.
    #[error("expected a JSON object at the top level")]
    NotAnObject,
}

/// Alias kept for call sites that read better with the longer name.
pub type ReactiveError = Error;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
