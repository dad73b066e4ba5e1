//! Service context bundling the query client and its cassette recorder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::LiveQueryClient;
use crate::adapters::recording::RecordingQueryClient;
use crate::adapters::replaying::ReplayingQueryClient;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::QueryClient;

/// Bundles the query client a pipeline fetches through.
///
/// Constructors wire up different adapter implementations (live, replaying,
/// recording).
pub struct ServiceContext {
    /// Client used for both queries.
    pub client: Arc<dyn QueryClient>,
    /// Present when traffic is being captured to a cassette.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context talking to the given GraphQL endpoint.
    #[must_use]
    pub fn live(endpoint: &str) -> Self {
        Self { client: Arc::new(LiveQueryClient::new(endpoint)), recorder: None }
    }

    /// Creates a context that talks to the endpoint and records every result.
    ///
    /// Nothing is written until [`finish`](Self::finish) is called.
    #[must_use]
    pub fn recording(endpoint: &str, path: &Path) -> Self {
        Self::recording_through(Arc::new(LiveQueryClient::new(endpoint)), endpoint, path)
    }

    /// Creates a recording context around an arbitrary client.
    #[must_use]
    pub fn recording_through(inner: Arc<dyn QueryClient>, endpoint: &str, path: &Path) -> Self {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "wardview-session", endpoint)));
        Self {
            client: Arc::new(RecordingQueryClient::new(inner, Arc::clone(&recorder))),
            recorder: Some(recorder),
        }
    }

    /// Creates a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = crate::cassette::load(path)?;
        Ok(Self {
            client: Arc::new(ReplayingQueryClient::new(CassetteReplayer::new(&cassette))),
            recorder: None,
        })
    }

    /// True when this context records a cassette.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Writes the recorded cassette, if any. Returns where it was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be written.
    pub fn finish(&self) -> Result<Option<PathBuf>, String> {
        let Some(recorder) = &self.recorder else {
            return Ok(None);
        };
        let recorder = recorder.lock().map_err(|_| "cassette recorder lock poisoned".to_string())?;
        recorder
            .write()
            .map(Some)
            .map_err(|e| format!("Failed to write cassette {}: {e}", recorder.path().display()))
    }
}
