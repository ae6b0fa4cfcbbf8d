//! Configuration file loading and run option resolution.
//!
//! Values are resolved once at startup with the precedence
//! CLI flag > environment > config file > built-in default, and the result
//! is passed by value to the rest of the program.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ImageError;
use crate::params::{
    validate_concurrency, validate_max_prompt_chars, validate_quality, ImageSize,
    DEFAULT_CONCURRENCY, DEFAULT_MAX_PROMPT_CHARS, DEFAULT_MODEL,
};

/// Environment variable holding the `OpenAI` API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// API endpoint configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Default values used when the matching CLI flag is absent.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// `OpenAI` API key.
    pub openai: Option<String>,
}

/// API endpoint configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    /// Base URL of an `OpenAI`-compatible API (e.g. a proxy).
    pub base_url: Option<String>,
}

/// Default parameter values from the config file.
#[derive(Debug, Default, Deserialize)]
pub struct DefaultsConfig {
    /// Default model name.
    pub model: Option<String>,
    /// Default image size.
    pub size: Option<String>,
    /// Default quality.
    pub quality: Option<String>,
    /// Default concurrency limit.
    pub concurrent: Option<usize>,
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Input text file.
    pub text_file: PathBuf,
    /// `OpenAI` API key, if any source provided one.
    pub api_key: Option<String>,
    /// Override for the API base URL.
    pub base_url: Option<String>,
    /// Destination directory for images.
    pub output_dir: PathBuf,
    /// Maximum number of requests in flight.
    pub concurrency: NonZeroUsize,
    /// Requested image size.
    pub size: ImageSize,
    /// Model identifier.
    pub model: String,
    /// Quality level.
    pub quality: String,
    /// Prompt length cap in characters.
    pub max_prompt_chars: usize,
}

impl RunConfig {
    /// Merge CLI flags, the API key environment value and the config file.
    ///
    /// `env_api_key` is the value of [`API_KEY_ENV`], read by the caller.
    ///
    /// # Errors
    ///
    /// Returns a config or argument error if any resolved value is invalid.
    pub fn resolve(
        cli: &Cli,
        env_api_key: Option<String>,
        config: Config,
    ) -> Result<Self, ImageError> {
        let Config { keys, api, defaults } = config;

        let present = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        let api_key = present(cli.api_key.clone())
            .or_else(|| present(env_api_key))
            .or_else(|| present(keys.openai));

        let concurrency = validate_concurrency(
            cli.concurrent.or(defaults.concurrent).unwrap_or(DEFAULT_CONCURRENCY),
        )
        .map_err(ImageError::Config)?;

        let size = cli
            .size
            .as_deref()
            .or(defaults.size.as_deref())
            .map_or(Ok(ImageSize::default()), str::parse)
            .map_err(ImageError::InvalidArgument)?;

        let quality = cli.quality.clone().or(defaults.quality).unwrap_or_else(|| "auto".into());
        validate_quality(&quality).map_err(ImageError::InvalidArgument)?;

        let max_prompt_chars =
            validate_max_prompt_chars(cli.max_prompt_chars).map_err(ImageError::InvalidArgument)?;

        Ok(Self {
            text_file: cli.text_file.clone(),
            api_key,
            base_url: api.base_url,
            output_dir: cli
                .output_dir
                .clone()
                .or(defaults.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            concurrency,
            size,
            model: cli.model.clone().or(defaults.model).unwrap_or_else(|| DEFAULT_MODEL.into()),
            quality,
            max_prompt_chars,
        })
    }

    /// The API key, or the error explaining how to provide one.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MissingApiKey`] if no source provided a key.
    pub fn require_api_key(&self) -> Result<&str, ImageError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ImageError::MissingApiKey { env_var: API_KEY_ENV.into() })
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `BULK_IMAGEN_CONFIG` environment variable
/// 3. `~/.config/bulk-imagen/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("BULK_IMAGEN_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/bulk-imagen/config.toml")
    } else {
        PathBuf::from("bulk-imagen.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("bulk-imagen").chain(args.iter().copied()))
    }

    fn config_from(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    fn resolved_key(args: &[&str], env: Option<&str>, file: Config) -> Option<String> {
        RunConfig::resolve(&cli(args), env.map(String::from), file).unwrap().api_key
    }

    #[test]
    fn builtin_defaults() {
        let run = RunConfig::resolve(&cli(&["story.txt"]), None, Config::default()).unwrap();
        assert_eq!(run.text_file, PathBuf::from("story.txt"));
        assert_eq!(run.api_key, None);
        assert_eq!(run.output_dir, PathBuf::from("."));
        assert_eq!(run.concurrency.get(), 5);
        assert_eq!(run.size, ImageSize::Auto);
        assert_eq!(run.model, "gpt-image-1");
        assert_eq!(run.quality, "auto");
        assert_eq!(run.max_prompt_chars, 4000);
    }

    #[test]
    fn api_key_precedence() {
        let file = || config_from("[keys]\nopenai = \"from-file\"");

        let key = resolved_key(&["-k", "from-flag", "t.txt"], Some("from-env"), file());
        assert_eq!(key.as_deref(), Some("from-flag"));

        let key = resolved_key(&["t.txt"], Some("from-env"), file());
        assert_eq!(key.as_deref(), Some("from-env"));

        let key = resolved_key(&["t.txt"], None, file());
        assert_eq!(key.as_deref(), Some("from-file"));
    }

    #[test]
    fn blank_api_key_sources_fall_through() {
        let file = || config_from("[keys]\nopenai = \"from-file\"");

        let key = resolved_key(&["-k", "", "t.txt"], Some("from-env"), file());
        assert_eq!(key.as_deref(), Some("from-env"));

        let key = resolved_key(&["t.txt"], Some(""), file());
        assert_eq!(key.as_deref(), Some("from-file"));

        let key = resolved_key(&["-k", " ", "t.txt"], Some("  "), file());
        assert_eq!(key.as_deref(), Some("from-file"));

        let key = resolved_key(&["-k", "", "t.txt"], Some(""), Config::default());
        assert_eq!(key, None);
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let run = RunConfig::resolve(&cli(&["t.txt"]), None, Config::default()).unwrap();
        assert!(matches!(run.require_api_key(), Err(ImageError::MissingApiKey { .. })));

        let blank = RunConfig::resolve(&cli(&["t.txt"]), Some("   ".into()), Config::default());
        assert!(blank.unwrap().require_api_key().is_err());
    }

    #[test]
    fn file_defaults_fill_missing_flags() {
        let file = config_from(
            r#"
[api]
base_url = "http://localhost:8080/v1"

[defaults]
model = "dall-e-3"
size = "1536x1024"
quality = "high"
concurrent = 2
output_dir = "renders"
"#,
        );
        let run = RunConfig::resolve(&cli(&["t.txt"]), None, file).unwrap();
        assert_eq!(run.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(run.model, "dall-e-3");
        assert_eq!(run.size, ImageSize::Landscape1536);
        assert_eq!(run.quality, "high");
        assert_eq!(run.concurrency.get(), 2);
        assert_eq!(run.output_dir, PathBuf::from("renders"));
    }

    #[test]
    fn flags_beat_file_defaults() {
        let file = config_from("[defaults]\nconcurrent = 2\nsize = \"1536x1024\"");
        let run =
            RunConfig::resolve(&cli(&["-c", "9", "-s", "1024x1536", "t.txt"]), None, file).unwrap();
        assert_eq!(run.concurrency.get(), 9);
        assert_eq!(run.size, ImageSize::Portrait1536);
    }

    #[test]
    fn zero_concurrency_is_config_error() {
        let err = RunConfig::resolve(&cli(&["-c", "0", "t.txt"]), None, Config::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::Config(_)));
    }

    #[test]
    fn bad_size_and_quality_are_rejected() {
        let err = RunConfig::resolve(&cli(&["-s", "4K", "t.txt"]), None, Config::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::InvalidArgument(ref m) if m.contains("Unsupported size")));

        let err = RunConfig::resolve(&cli(&["-q", "ultra", "t.txt"]), None, Config::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::InvalidArgument(ref m) if m.contains("Unsupported quality")));
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.keys.openai.is_none());
        assert!(config.defaults.concurrent.is_none());
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("bulk_imagen_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
