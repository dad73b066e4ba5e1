//! Replaying adapter for the `QueryClient` port.

use std::sync::Mutex;

use serde_json::Value;
use tracing::warn;

use crate::cassette::format::QUERY_PORT;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::FetchError;
use crate::ports::{QueryClient, QueryFuture, QueryRequest};

/// Serves recorded query results from a cassette.
///
/// Interactions are matched by operation in recording order. Once a queue
/// runs dry, further queries never resolve, the same as a request the server
/// never answers.
pub struct ReplayingQueryClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingQueryClient {
    /// Creates a replaying client from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

/// Decodes the `{"Ok": data}` / `{"Err": message}` cassette convention.
fn replay_result(output: Value) -> Result<Value, FetchError> {
    match output {
        Value::Object(mut map) => {
            if let Some(err) = map.remove("Err") {
                let message = match err {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Err(FetchError::Replayed(message));
            }
            match map.remove("Ok") {
                Some(data) => Ok(data),
                None => Ok(Value::Object(map)),
            }
        }
        other => Ok(other),
    }
}

impl QueryClient for ReplayingQueryClient {
    fn query(&self, request: &QueryRequest) -> QueryFuture<'_> {
        let method = request.operation.as_str();
        let output = match self.replayer.lock() {
            Ok(mut replayer) => {
                replayer.next_interaction(QUERY_PORT, method).map(|i| i.output.clone())
            }
            Err(_) => {
                return Box::pin(async {
                    Err::<Value, _>(FetchError::Replayed("cassette replayer lock poisoned".into()))
                })
            }
        };

        match output {
            Some(output) => Box::pin(async move { replay_result(output) }),
            None => {
                warn!(operation = method, "cassette exhausted; query will not resolve");
                Box::pin(std::future::pending::<Result<Value, FetchError>>())
            }
        }
    }
}
