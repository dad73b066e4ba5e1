//! Cassette format for recording and replaying query traffic.

pub mod format;
pub mod recorder;
pub mod replayer;

use std::path::Path;

use self::format::Cassette;

/// Reads and parses a cassette file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid cassette.
pub fn load(path: &Path) -> Result<Cassette, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
}
