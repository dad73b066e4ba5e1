//! `wardview compose` command.

use std::path::Path;

use crate::join::compose_rows;
use crate::model::{LocationData, WorkspaceData};

/// Execute the `compose` command.
///
/// Prints the joined rows as a JSON array.
///
/// # Errors
///
/// Returns an error string if a payload cannot be read or the rows cannot be
/// serialized.
pub fn run(locations: &Path, workspaces: Option<&Path>) -> Result<(), String> {
    let location: LocationData = super::read_payload(locations)?;
    let workspaces: Option<WorkspaceData> = workspaces.map(super::read_payload).transpose()?;

    let rows = compose_rows(Some(&location), workspaces.as_ref());
    let json = serde_json::to_string_pretty(&rows)
        .map_err(|e| format!("Failed to serialize rows: {e}"))?;
    println!("{json}");
    Ok(())
}
