//! Service context that bundles all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::openai::OpenAiGenerator;
use crate::adapters::recording::image_generator::RecordingImageGenerator;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::RunConfig;
use crate::error::ImageError;
use crate::ports::ImageGenerator;

/// Environment variable naming a cassette to replay instead of calling the API.
pub const REPLAY_ENV: &str = "BULK_IMAGEN_REPLAY";

/// Environment variable that turns on recording when set to `1` or `true`.
pub const RECORD_ENV: &str = "BULK_IMAGEN_REC";

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Image generator port, shared by all jobs.
    pub generator: Arc<dyn ImageGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette file to disk.
    ///
    /// Returns the cassette path and the number of recorded interactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<(PathBuf, usize), String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        let count = recorder.interaction_count();
        let path = recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))?;
        Ok((path, count))
    }
}

impl ServiceContext {
    /// Create a live context that calls the `OpenAI` API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured.
    pub fn live(run: &RunConfig) -> Result<Self, ImageError> {
        let generator: Arc<dyn ImageGenerator> = Arc::new(live_generator(run)?);
        Ok(Self { generator })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured.
    pub fn recording(run: &RunConfig) -> Result<(Self, RecordingSession), ImageError> {
        let live = live_generator(run)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".bulk-imagen/cassettes")
            .join(&timestamp)
            .join("image_generator.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-image_generator"),
            get_commit_hash(),
        )));

        let generator = RecordingImageGenerator::new(Box::new(live), Arc::clone(&recorder));
        Ok((Self { generator: Arc::new(generator) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file. No API key is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, ImageError> {
        let replayer = load_cassette(path)
            .map_err(|e| ImageError::Config(format!("Failed to load cassette: {e}")))?;
        let generator = ReplayingImageGenerator::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { generator: Arc::new(generator) })
    }
}

fn live_generator(run: &RunConfig) -> Result<OpenAiGenerator, ImageError> {
    let key = run.require_api_key()?.to_string();
    Ok(match &run.base_url {
        Some(url) => OpenAiGenerator::with_base_url(key, url.clone()),
        None => OpenAiGenerator::new(key),
    })
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
