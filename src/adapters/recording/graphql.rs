//! Recording adapter for the `QueryClient` port.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::warn;

use crate::cassette::format::QUERY_PORT;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::FetchError;
use crate::ports::{QueryClient, QueryFuture, QueryRequest};

/// Records query traffic while delegating to an inner client.
///
/// An interaction is recorded when its result arrives, so a cassette lists
/// results in completion order. Replay matches per operation, which keeps
/// that order stable enough.
pub struct RecordingQueryClient {
    inner: Arc<dyn QueryClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingQueryClient {
    /// Creates a recording client wrapping the given implementation.
    pub fn new(inner: Arc<dyn QueryClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// Serializes a result using the `{"Ok": v}` / `{"Err": message}` convention.
fn result_output(result: &Result<Value, FetchError>) -> Value {
    match result {
        Ok(data) => json!({ "Ok": data }),
        Err(e) => json!({ "Err": e.to_string() }),
    }
}

impl QueryClient for RecordingQueryClient {
    fn query(&self, request: &QueryRequest) -> QueryFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.query(&request).await;

            let input = json!({
                "variables": request.variables,
                "fetchPolicy": request.fetch_policy,
            });
            match self.recorder.lock() {
                Ok(mut recorder) => recorder.record(
                    QUERY_PORT,
                    request.operation.as_str(),
                    input,
                    result_output(&result),
                ),
                Err(_) => warn!(operation = %request.operation, "recorder lock poisoned; dropped"),
            }

            result
        })
    }
}
