//! Query client port for the GraphQL fetch layer.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// Boxed future type alias used by [`QueryClient`] to keep the trait dyn-compatible.
///
/// Resolves to the `data` object of the response. A future that never
/// resolves is a valid outcome and is surfaced as a query that stays loading.
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, FetchError>> + Send + 'a>>;

/// Cache behavior requested from the fetch layer.
///
/// The exact semantics belong to the client; the pipeline only forwards it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Serve from cache when possible, otherwise hit the network.
    #[default]
    CacheFirst,
    /// Serve from cache and refresh from the network.
    CacheAndNetwork,
    /// Never touch the network.
    CacheOnly,
    /// Always hit the network.
    NetworkOnly,
}

impl FetchPolicy {
    /// Wire name of the policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheFirst => "cache-first",
            Self::CacheAndNetwork => "cache-and-network",
            Self::CacheOnly => "cache-only",
            Self::NetworkOnly => "network-only",
        }
    }
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two queries a workspaces pipeline issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Location tree query, variable `assignedBedsOnly: Boolean`.
    Locations,
    /// Workspace query, variable `visitIds: [Long]`.
    Workspaces,
}

impl Operation {
    /// Name used in logs and cassettes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locations => "locations",
            Self::Workspaces => "workspaces",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query to run against the fetch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Which of the two queries this is.
    pub operation: Operation,
    /// GraphQL document text.
    pub document: String,
    /// Variables object sent with the document.
    pub variables: Value,
    /// Requested cache behavior.
    pub fetch_policy: FetchPolicy,
}

/// Runs queries against a GraphQL backend.
pub trait QueryClient: Send + Sync {
    /// Runs the query and resolves to the response `data` object.
    ///
    /// # Errors
    ///
    /// Resolves to an error when the transport fails, the server rejects the
    /// request, or the response carries GraphQL errors.
    fn query(&self, request: &QueryRequest) -> QueryFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_policy_uses_kebab_case() {
        let policy: FetchPolicy = serde_json::from_value(json!("cache-and-network")).unwrap();
        assert_eq!(policy, FetchPolicy::CacheAndNetwork);
        assert_eq!(serde_json::to_value(FetchPolicy::NetworkOnly).unwrap(), json!("network-only"));
        assert_eq!(FetchPolicy::CacheOnly.to_string(), "cache-only");
    }

    #[test]
    fn unknown_fetch_policy_is_rejected() {
        assert!(serde_json::from_value::<FetchPolicy>(json!("standby")).is_err());
    }
}
