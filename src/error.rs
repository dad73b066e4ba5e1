//! Error types for configuration and fetching.

use thiserror::Error;

/// Problems with the arguments used to configure a workspaces pipeline.
///
/// None of these are fatal: the pipeline logs them and falls back to
/// passthrough, issuing no fetches.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration argument had a shape that is not understood.
    ///
    /// Accepted shapes are an absent argument, `null`, or an object that
    /// carries an `options` entry.
    #[error(
        "invalid workspaces argument ({kind}): expected nothing, null, or an object with `options`"
    )]
    InvalidShape {
        /// JSON kind of the rejected value.
        kind: &'static str,
    },

    /// A query document override was not a string.
    #[error("`{key}` must be a GraphQL document string")]
    InvalidQuery {
        /// Argument key holding the bad document.
        key: &'static str,
    },

    /// A known option carried a value of the wrong type.
    #[error("invalid workspaces options: {0}")]
    InvalidOptions(#[source] serde_json::Error),
}

/// Failures reported by the fetch layer.
///
/// These are carried on the query state unchanged so callers can see exactly
/// what the transport reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Body or error message from the response.
        message: String,
    },

    /// The response carried GraphQL errors.
    #[error("query returned errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The `data` payload did not match the expected shape.
    #[error("failed to decode {operation} payload: {message}")]
    Decode {
        /// Operation whose payload was rejected.
        operation: String,
        /// Decoder message.
        message: String,
    },

    /// A failure recorded in a cassette, replayed verbatim.
    #[error("{0}")]
    Replayed(String),
}

/// Short name for the JSON kind of a value, used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
