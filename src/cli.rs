//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;

use crate::params::DEFAULT_MAX_PROMPT_CHARS;

/// Generate one image per paragraph of a text file with the `OpenAI` Images API.
///
/// Paragraphs are separated by blank lines. Images are written as
/// `<output-dir>/<n>.png`, numbered by paragraph.
#[derive(Parser, Debug)]
#[command(name = "bulk-imagen", version, about)]
pub struct Cli {
    /// Text file containing paragraphs separated by blank lines.
    pub text_file: PathBuf,

    /// `OpenAI` API key (defaults to `OPENAI_API_KEY`).
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Directory for generated images [default: .].
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of concurrent requests [default: 5].
    #[arg(short, long)]
    pub concurrent: Option<usize>,

    /// Image size: auto, 1024x1024, 1536x1024, 1024x1536 [default: auto].
    #[arg(short, long)]
    pub size: Option<String>,

    /// Model name [default: gpt-image-1].
    #[arg(short, long)]
    pub model: Option<String>,

    /// Quality: auto, low, medium, high [default: auto].
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Paragraphs longer than this many characters are cut.
    #[arg(long, default_value_t = DEFAULT_MAX_PROMPT_CHARS)]
    pub max_prompt_chars: usize,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_text_file() {
        let cli = Cli::parse_from(["bulk-imagen", "story.txt"]);
        assert_eq!(cli.text_file, PathBuf::from("story.txt"));
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from(["bulk-imagen", "story.txt"]);
        assert!(cli.api_key.is_none());
        assert!(cli.output_dir.is_none());
        assert!(cli.concurrent.is_none());
        assert!(cli.size.is_none());
        assert!(cli.model.is_none());
        assert!(cli.quality.is_none());
        assert_eq!(cli.max_prompt_chars, 4000);
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn all_options() {
        let cli = Cli::parse_from([
            "bulk-imagen",
            "-k",
            "sk-test",
            "-o",
            "renders",
            "-c",
            "3",
            "-s",
            "1536x1024",
            "-m",
            "dall-e-3",
            "-q",
            "high",
            "--max-prompt-chars",
            "1000",
            "--config",
            "my.toml",
            "-v",
            "story.txt",
        ]);
        assert_eq!(cli.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("renders")));
        assert_eq!(cli.concurrent, Some(3));
        assert_eq!(cli.size.as_deref(), Some("1536x1024"));
        assert_eq!(cli.model.as_deref(), Some("dall-e-3"));
        assert_eq!(cli.quality.as_deref(), Some("high"));
        assert_eq!(cli.max_prompt_chars, 1000);
        assert_eq!(cli.config.as_deref(), Some("my.toml"));
        assert!(cli.verbose);
        assert_eq!(cli.text_file, PathBuf::from("story.txt"));
    }

    #[test]
    fn long_flags() {
        let cli = Cli::parse_from([
            "bulk-imagen",
            "--api-key",
            "sk-long",
            "--output-dir",
            "out",
            "--concurrent",
            "8",
            "story.txt",
        ]);
        assert_eq!(cli.api_key.as_deref(), Some("sk-long"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.concurrent, Some(8));
    }

    #[test]
    fn text_file_is_required() {
        assert!(Cli::try_parse_from(["bulk-imagen"]).is_err());
    }

    #[test]
    fn concurrency_must_be_a_number() {
        assert!(Cli::try_parse_from(["bulk-imagen", "-c", "many", "story.txt"]).is_err());
    }
}
