//! `wardview visit-ids` command.

use std::path::Path;

use crate::extract::visit_ids_from_facilities;
use crate::model::LocationData;

/// Execute the `visit-ids` command.
///
/// # Errors
///
/// Returns an error string if the location payload cannot be read.
pub fn run(locations: &Path, conflicting_only: bool, add_conflicting: bool) -> Result<(), String> {
    let location: LocationData = super::read_payload(locations)?;
    let ids =
        visit_ids_from_facilities(location.facilities.as_deref(), conflicting_only, add_conflicting);
    let json = serde_json::to_string(&ids).map_err(|e| format!("Failed to serialize ids: {e}"))?;
    println!("{json}");
    Ok(())
}
