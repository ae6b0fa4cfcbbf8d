//! Parameter parsing and validation for CLI and config inputs.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of requests in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default model used for generation.
pub const DEFAULT_MODEL: &str = "gpt-image-1";

/// Default maximum prompt length in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 4000;

/// Image dimensions accepted by the `OpenAI` Images API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    /// Let the API pick.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// 1024x1024.
    #[serde(rename = "1024x1024")]
    Square1024,
    /// 1536x1024.
    #[serde(rename = "1536x1024")]
    Landscape1536,
    /// 1024x1536.
    #[serde(rename = "1024x1536")]
    Portrait1536,
}

impl ImageSize {
    /// The value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Square1024 => "1024x1024",
            Self::Landscape1536 => "1536x1024",
            Self::Portrait1536 => "1024x1536",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "1024x1024" => Ok(Self::Square1024),
            "1536x1024" => Ok(Self::Landscape1536),
            "1024x1536" => Ok(Self::Portrait1536),
            _ => Err(format!(
                "Unsupported size '{s}'. Valid: auto, 1024x1024, 1536x1024, 1024x1536"
            )),
        }
    }
}

/// Validate the quality parameter.
///
/// # Errors
///
/// Returns an error if the quality value is not recognized.
pub fn validate_quality(quality: &str) -> Result<(), String> {
    match quality {
        "auto" | "low" | "medium" | "high" => Ok(()),
        _ => Err(format!("Unsupported quality '{quality}'. Valid: auto, low, medium, high")),
    }
}

/// Validate the concurrency limit.
///
/// # Errors
///
/// Returns an error if the limit is zero.
pub fn validate_concurrency(limit: usize) -> Result<NonZeroUsize, String> {
    NonZeroUsize::new(limit).ok_or_else(|| "Concurrency must be at least 1".to_string())
}

/// Validate the prompt length cap.
///
/// # Errors
///
/// Returns an error if the cap is zero.
pub fn validate_max_prompt_chars(max: usize) -> Result<usize, String> {
    if max == 0 {
        Err("Maximum prompt length must be at least 1".to_string())
    } else {
        Ok(max)
    }
}
