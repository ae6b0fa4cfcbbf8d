//! Bounded-concurrency job dispatcher.
//!
//! Every job runs in its own task behind a counting semaphore, so at most
//! `limit` jobs are in flight and a new one is admitted as soon as any
//! permit is released. Outcomes are collected in input order no matter
//! which job finishes first, and a failing or panicking job only affects
//! its own outcome.

use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ImageError;
use crate::extract::Prompt;
use crate::output::image_path;

/// A prompt paired with the file its image is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The prompt to render.
    pub prompt: Prompt,
    /// Destination of the generated image.
    pub output_path: PathBuf,
}

/// Build one job per prompt, writing to `<output_dir>/<index>.png`.
#[must_use]
pub fn plan_jobs(prompts: Vec<Prompt>, output_dir: &Path) -> Vec<Job> {
    prompts
        .into_iter()
        .map(|prompt| Job { output_path: image_path(output_dir, prompt.index), prompt })
        .collect()
}

/// Terminal result of one job.
#[derive(Debug)]
pub enum Outcome {
    /// The image was generated and written.
    Success {
        /// Prompt index.
        index: usize,
        /// Where the image was written.
        path: PathBuf,
        /// Number of bytes written.
        bytes: usize,
    },
    /// The job failed or never started.
    Failure {
        /// Prompt index.
        index: usize,
        /// What went wrong.
        error: ImageError,
    },
}

impl Outcome {
    /// Prompt index of the job this outcome belongs to.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Whether the job succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Live notifications emitted while jobs run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A job was admitted and is about to call the API.
    Started {
        /// Prompt index.
        index: usize,
        /// Number of jobs in the run.
        total: usize,
        /// Prompt text.
        prompt: String,
    },
    /// A job finished successfully.
    Saved {
        /// Prompt index.
        index: usize,
        /// Number of jobs in the run.
        total: usize,
        /// Where the image was written.
        path: PathBuf,
        /// Number of bytes written.
        bytes: usize,
    },
    /// A job finished with an error.
    Failed {
        /// Prompt index.
        index: usize,
        /// Number of jobs in the run.
        total: usize,
        /// Error text.
        message: String,
    },
    /// A job was not admitted because the run was cancelled.
    Skipped {
        /// Prompt index.
        index: usize,
        /// Number of jobs in the run.
        total: usize,
    },
}

/// Runs jobs with a fixed upper bound on concurrency.
pub struct Dispatcher {
    limit: NonZeroUsize,
    cancel: CancellationToken,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

enum Slot {
    Running { index: usize, handle: JoinHandle<Outcome> },
    Done(Outcome),
}

impl Dispatcher {
    /// Create a dispatcher that keeps at most `limit` jobs in flight.
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self { limit, cancel: CancellationToken::new(), progress: None }
    }

    /// Stop admitting new jobs once `cancel` fires. Jobs already running finish.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Send progress events to `progress` while jobs run.
    #[must_use]
    pub fn with_progress(mut self, progress: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every job through `perform` and return one outcome per job, in
    /// input order.
    ///
    /// `perform` returns the number of bytes written. It is called at most
    /// once per job; jobs not admitted before cancellation get
    /// [`ImageError::Cancelled`].
    pub async fn run<F, Fut>(&self, jobs: Vec<Job>, perform: F) -> Vec<Outcome>
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<usize, ImageError>> + Send + 'static,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let total = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.limit.get().min(total)));
        let perform = Arc::new(perform);
        let mut slots = Vec::with_capacity(total);

        tracing::info!(jobs = total, limit = self.limit.get(), "Dispatching jobs");

        for job in jobs {
            let index = job.prompt.index;
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                emit(self.progress.as_ref(), ProgressEvent::Skipped { index, total });
                slots.push(Slot::Done(Outcome::Failure { index, error: ImageError::Cancelled }));
                continue;
            };

            let perform = Arc::clone(&perform);
            let progress = self.progress.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                tracing::debug!(index, "Job admitted");
                emit(
                    progress.as_ref(),
                    ProgressEvent::Started { index, total, prompt: job.prompt.text.clone() },
                );
                let path = job.output_path.clone();
                let outcome = match (*perform)(job).await {
                    Ok(bytes) => Outcome::Success { index, path, bytes },
                    Err(error) => Outcome::Failure { index, error },
                };
                emit(progress.as_ref(), finished_event(&outcome, total));
                outcome
            });
            slots.push(Slot::Running { index, handle });
        }

        let mut outcomes = Vec::with_capacity(total);
        for slot in slots {
            let outcome = match slot {
                Slot::Done(outcome) => outcome,
                Slot::Running { index, handle } => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let outcome = Outcome::Failure {
                            index,
                            error: ImageError::TaskFailed(e.to_string()),
                        };
                        emit(self.progress.as_ref(), finished_event(&outcome, total));
                        outcome
                    }
                },
            };
            if let Outcome::Failure { index, error } = &outcome {
                tracing::debug!(index, error = %error, "Job failed");
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn finished_event(outcome: &Outcome, total: usize) -> ProgressEvent {
    match outcome {
        Outcome::Success { index, path, bytes } => {
            ProgressEvent::Saved { index: *index, total, path: path.clone(), bytes: *bytes }
        }
        Outcome::Failure { index, error } => {
            ProgressEvent::Failed { index: *index, total, message: error.to_string() }
        }
    }
}

fn emit(progress: Option<&UnboundedSender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}
