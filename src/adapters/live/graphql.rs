//! Live adapter for the `QueryClient` port over GraphQL-over-HTTP.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::ports::{QueryClient, QueryFuture, QueryRequest};
use crate::queries::operation_name;

/// Query client that POSTs documents to a GraphQL endpoint.
///
/// The fetch policy is logged but otherwise not acted on. This client keeps
/// no cache, so every request hits the network.
pub struct LiveQueryClient {
    client: Client,
    endpoint: String,
}

impl LiveQueryClient {
    /// Creates a client for the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into() }
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request body of a GraphQL POST.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
}

/// Top-level GraphQL response.
#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// A single entry of the `errors` array.
#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Turns a raw HTTP status and body into the `data` payload or an error.
fn parse_response(status: u16, body: &str) -> Result<Value, FetchError> {
    let parsed = serde_json::from_str::<GraphQlResponse>(body);

    if !(200..300).contains(&status) {
        let message = match parsed {
            Ok(response) if !response.errors.is_empty() => {
                response.errors.into_iter().map(|e| e.message).collect::<Vec<_>>().join("; ")
            }
            _ => body.to_string(),
        };
        return Err(FetchError::Status { status, message });
    }

    let response = parsed.map_err(|e| FetchError::Transport(format!("invalid response: {e}")))?;
    if !response.errors.is_empty() {
        return Err(FetchError::GraphQl(response.errors.into_iter().map(|e| e.message).collect()));
    }
    Ok(response.data.unwrap_or(Value::Null))
}

impl QueryClient for LiveQueryClient {
    fn query(&self, request: &QueryRequest) -> QueryFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            debug!(
                operation = %request.operation,
                fetch_policy = %request.fetch_policy,
                endpoint = %self.endpoint,
                "sending query"
            );
            let body = GraphQlRequest {
                query: &request.document,
                variables: &request.variables,
                operation_name: operation_name(&request.document),
            };

            let response = self
                .client
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| FetchError::Transport(format!("failed to read response: {e}")))?;

            parse_response(status, &text)
        })
    }
}
