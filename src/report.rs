//! Progress lines and the end-of-run summary.

use std::fmt::Write as _;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::dispatch::{Outcome, ProgressEvent};
use crate::extract::truncate_chars;

/// Characters of the prompt shown in a progress line.
const PREVIEW_CHARS: usize = 50;

/// Aggregate result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of jobs.
    pub total: usize,
    /// Number of images written.
    pub succeeded: usize,
    /// Index and error text of each failed job, in input order.
    pub failures: Vec<(usize, String)>,
}

impl Summary {
    /// Tally an ordered outcome list.
    #[must_use]
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let failures = outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Failure { error, .. } => Some((o.index(), error.to_string())),
                Outcome::Success { .. } => None,
            })
            .collect();
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self { total: outcomes.len(), succeeded, failures }
    }

    /// Number of failed jobs.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Human-readable summary block.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("{}/{} succeeded", self.succeeded, self.total);
        if !self.failures.is_empty() {
            out.push_str("\nFailed:");
            for (index, message) in &self.failures {
                let _ = write!(out, "\n  #{index}: {message}");
            }
        }
        out
    }
}

/// Render one progress event as a single line.
#[must_use]
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { index, total, prompt } => {
            let preview = truncate_chars(&prompt.replace('\n', " "), PREVIEW_CHARS);
            format!("[{index}/{total}] Generating: {preview}...")
        }
        ProgressEvent::Saved { index, total, path, bytes } => {
            format!("[{index}/{total}] Saved: {} ({bytes} bytes)", path.display())
        }
        ProgressEvent::Failed { index, total, message } => {
            format!("[{index}/{total}] Failed: {message}")
        }
        ProgressEvent::Skipped { index, total } => {
            format!("[{index}/{total}] Skipped: run cancelled")
        }
    }
}

/// Print progress lines to stderr until every sender is dropped.
pub fn spawn_progress_printer(mut events: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprintln!("{}", format_event(&event));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::path::{Path, PathBuf};

    use crate::dispatch::{plan_jobs, Dispatcher};
    use crate::error::ImageError;
    use crate::extract::extract_prompts;

    #[tokio::test]
    async fn three_paragraphs_all_succeed() {
        let prompts = extract_prompts("A\n\nB\n\nC", 4000).unwrap();
        let texts: Vec<_> = prompts.iter().map(|p| p.text.clone()).collect();
        assert_eq!(texts, ["A", "B", "C"]);

        let jobs = plan_jobs(prompts, Path::new("out"));
        let outcomes = Dispatcher::new(NonZeroUsize::new(2).unwrap())
            .run(jobs, |job| async move { Ok(job.prompt.text.len()) })
            .await;

        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed(), 0);
        assert_eq!(summary.render(), "3/3 succeeded");
    }

    #[test]
    fn summary_lists_failures_in_order() {
        let outcomes = vec![
            Outcome::Success { index: 1, path: PathBuf::from("1.png"), bytes: 10 },
            Outcome::Failure {
                index: 2,
                error: ImageError::RateLimited { message: "quota exceeded".into() },
            },
            Outcome::Failure { index: 3, error: ImageError::Cancelled },
        ];
        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(
            summary.render(),
            "1/3 succeeded\nFailed:\n  #2: Rate limited: quota exceeded\n  #3: Cancelled before start"
        );
    }

    #[test]
    fn empty_summary() {
        let summary = Summary::from_outcomes(&[]);
        assert_eq!(summary.render(), "0/0 succeeded");
    }

    #[test]
    fn started_line_previews_prompt() {
        let event = ProgressEvent::Started { index: 2, total: 9, prompt: "x".repeat(80) };
        assert_eq!(format_event(&event), format!("[2/9] Generating: {}...", "x".repeat(50)));

        let event = ProgressEvent::Started { index: 1, total: 1, prompt: "two\nlines".into() };
        assert_eq!(format_event(&event), "[1/1] Generating: two lines...");
    }

    #[test]
    fn finished_lines() {
        let saved = ProgressEvent::Saved {
            index: 4,
            total: 5,
            path: PathBuf::from("out/4.png"),
            bytes: 1234,
        };
        assert_eq!(format_event(&saved), "[4/5] Saved: out/4.png (1234 bytes)");

        let failed = ProgressEvent::Failed { index: 3, total: 5, message: "boom".into() };
        assert_eq!(format_event(&failed), "[3/5] Failed: boom");

        let skipped = ProgressEvent::Skipped { index: 5, total: 5 };
        assert_eq!(format_event(&skipped), "[5/5] Skipped: run cancelled");
    }
}
