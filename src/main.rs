//! bulk-imagen - one generated image per paragraph of a text file.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod dispatch;
mod error;
mod extract;
mod output;
mod params;
mod ports;
mod render;
mod report;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::{discover_config_path, Config, RunConfig, API_KEY_ENV};
use crate::context::{ServiceContext, RECORD_ENV, REPLAY_ENV};
use crate::dispatch::{plan_jobs, Dispatcher};
use crate::error::ImageError;
use crate::extract::extract_prompts;
use crate::output::ensure_output_dir;
use crate::render::{render_job, RenderSettings};
use crate::report::{spawn_progress_printer, Summary};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "bulk_imagen=debug" } else { "bulk_imagen=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), ImageError> {
    // Resolve configuration
    let config_path = discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?;
    let run_config = RunConfig::resolve(&cli, std::env::var(API_KEY_ENV).ok(), config)?;

    if cli.verbose {
        eprintln!("Config file: {}", config_path.display());
        eprintln!(
            "Model: {}, size: {}, quality: {}, concurrency: {}",
            run_config.model, run_config.size, run_config.quality, run_config.concurrency
        );
    }

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var(REPLAY_ENV).ok();
    let is_recording = std::env::var(RECORD_ENV).is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        if cli.verbose {
            eprintln!("Replaying from: {cassette_path}");
        }
        (ServiceContext::replaying(Path::new(cassette_path))?, None)
    } else if is_recording {
        if cli.verbose {
            eprintln!("Recording mode enabled");
        }
        let (ctx, session) = ServiceContext::recording(&run_config)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&run_config)?, None)
    };

    // Read and split the input
    let content = std::fs::read_to_string(&run_config.text_file)
        .map_err(|source| ImageError::Input { path: run_config.text_file.clone(), source })?;
    let prompts = extract_prompts(&content, run_config.max_prompt_chars)?;
    eprintln!("Found {} paragraphs to process.", prompts.len());

    ensure_output_dir(&run_config.output_dir)?;
    let jobs = plan_jobs(prompts, &run_config.output_dir);

    // Dispatch
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(watch_interrupt(cancel.clone()));
    let (progress_tx, progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = spawn_progress_printer(progress_rx);

    let settings = Arc::new(RenderSettings {
        model: run_config.model.clone(),
        size: run_config.size,
        quality: run_config.quality.clone(),
    });
    let generator = Arc::clone(&ctx.generator);
    let outcomes = Dispatcher::new(run_config.concurrency)
        .with_cancellation(cancel)
        .with_progress(progress_tx)
        .run(jobs, move |job| render_job(Arc::clone(&generator), Arc::clone(&settings), job))
        .await;

    interrupt.abort();
    let _ = printer.await;
    drop(ctx);

    // Finish recording if active
    if let Some(session) = recording_session {
        match session.finish() {
            Ok((path, count)) => {
                eprintln!("Cassette saved: {} ({count} interactions)", path.display());
            }
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    let summary = Summary::from_outcomes(&outcomes);
    tracing::info!(succeeded = summary.succeeded, failed = summary.failed(), "Run finished");
    println!("{}", summary.render());

    if summary.succeeded == 0 {
        return Err(ImageError::NothingSucceeded { total: summary.total });
    }
    Ok(())
}

/// Stop admitting jobs on the first Ctrl-C and exit immediately on the second.
async fn watch_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    eprintln!("Interrupted: waiting for running jobs (press Ctrl-C again to abort)");
    cancel.cancel();
    if tokio::signal::ctrl_c().await.is_ok() {
        process::exit(130);
    }
}
