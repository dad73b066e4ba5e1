//! Records interactions into a cassette file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::format::{Cassette, Interaction};

/// Collects interactions and writes them as a YAML cassette file.
///
/// Recording clients share one recorder behind a mutex, and fetches still
/// in flight may hold a reference when the session ends, so writing does not
/// consume the recorder.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    endpoint: String,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            interactions: Vec::new(),
            next_seq: 0,
        }
    }

    /// Record an interaction. The `seq` field is assigned automatically.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let interaction = Interaction {
            seq: self.next_seq,
            port: port.into(),
            method: method.into(),
            input,
            output,
        };
        self.next_seq += 1;
        self.interactions.push(interaction);
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// True before anything has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Where the cassette will be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write everything recorded so far to the cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            endpoint: self.endpoint.clone(),
            interactions: self.interactions.clone(),
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, yaml)?;
        debug!(path = %self.path.display(), interactions = self.len(), "wrote cassette");
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_write() {
        let dir = std::env::temp_dir().join("wardview_cassette_recorder_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ward.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "ward-recording", "http://ward/graphql");
        assert!(recorder.is_empty());
        recorder.record(
            "graphql",
            "locations",
            json!({"variables": {"assignedBedsOnly": false}}),
            json!({"Ok": {"facilities": []}}),
        );
        recorder.record(
            "graphql",
            "workspaces",
            json!({"variables": {"visitIds": [1]}}),
            json!({"Err": "timeout"}),
        );

        let result_path = recorder.write().expect("write should succeed");
        assert_eq!(result_path, path);
        assert_eq!(recorder.path(), path.as_path());

        let content = std::fs::read_to_string(&path).unwrap();
        let cassette: Cassette = serde_yaml::from_str(&content).unwrap();

        assert_eq!(cassette.name, "ward-recording");
        assert_eq!(cassette.endpoint, "http://ward/graphql");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].seq, 0);
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].method, "workspaces");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writing_twice_keeps_later_interactions() {
        let dir = std::env::temp_dir().join("wardview_cassette_rewrite_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ward.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "ward", "");
        recorder.record("graphql", "locations", json!({}), json!({"Ok": {}}));
        recorder.write().unwrap();
        recorder.record("graphql", "locations", json!({}), json!({"Ok": {}}));
        recorder.write().unwrap();

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.interactions.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
