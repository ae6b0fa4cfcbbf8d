//! Unified error type for bulk-imagen.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while generating images.
///
/// Configuration and input variants are fatal and abort the run before any
/// job starts. The per-job variants are recorded in that job's outcome and
/// never stop sibling jobs.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No API key configured.
    #[error("No OpenAI API key. Pass --api-key, set {env_var} or add it to the config file.")]
    MissingApiKey {
        /// The environment variable name.
        env_var: String,
    },

    /// The input text file could not be read.
    #[error("Cannot read input file {}: {source}", path.display())]
    Input {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input text contained no paragraphs.
    #[error("No paragraphs found in the input text")]
    EmptyInput,

    /// An API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The API rejected the request because of rate or quota limits.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Error message from the API.
        message: String,
    },

    /// The API rejected the credential.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The API answered successfully but the payload held no usable image.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cassette could not serve the request.
    #[error("Replay error: {0}")]
    Replay(String),

    /// A failure captured in a cassette, replayed with its original message.
    #[error("{0}")]
    Recorded(String),

    /// The job was never started because the run was cancelled.
    #[error("Cancelled before start")]
    Cancelled,

    /// The worker running the job panicked or was aborted.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Every job in the run failed.
    #[error("No images were generated ({total} failed)")]
    NothingSucceeded {
        /// Number of jobs attempted.
        total: usize,
    },
}
