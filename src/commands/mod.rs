//! Command dispatch and handlers.

pub mod compose;
pub mod fetch;
pub mod visit_ids;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Compose { locations, workspaces } => {
            compose::run(locations, workspaces.as_deref())
        }
        Command::VisitIds { locations, conflicting_only, add_conflicting } => {
            visit_ids::run(locations, *conflicting_only, *add_conflicting)
        }
        Command::Fetch { endpoint, cassette, record, config, context, idle_ms } => {
            fetch::run(&fetch::FetchArgs {
                endpoint: endpoint.as_deref(),
                cassette: cassette.as_deref(),
                record: record.as_deref(),
                config: config.as_deref(),
                context: context.as_deref(),
                idle_ms: *idle_ms,
            })
        }
    }
}

/// Reads a YAML or JSON document.
fn read_document(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Reads a query payload, unwrapping a full `{"data": ...}` response if given one.
fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let mut document = read_document(path)?;
    if document.get("data").is_some_and(Value::is_object) {
        document = document["data"].take();
    }
    serde_json::from_value(document)
        .map_err(|e| format!("Unexpected payload in {}: {e}", path.display()))
}
