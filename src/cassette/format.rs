//! Cassette data structures for recording and replaying query traffic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Port name under which query traffic is recorded.
pub const QUERY_PORT: &str = "graphql";

/// A single recorded exchange with the fetch layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name, [`QUERY_PORT`] for query traffic.
    pub port: String,
    /// Operation name (`locations` or `workspaces`).
    pub method: String,
    /// Variables and fetch policy sent with the query.
    pub input: serde_json::Value,
    /// `{"Ok": data}` or `{"Err": message}`.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Endpoint the traffic was recorded against.
    #[serde(default)]
    pub endpoint: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}
