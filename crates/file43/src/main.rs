mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use tokio::sync::broadcast::error::RecvError;

use file43::config::{self, Config, PreferencesStore};
use file43::logging::{self, LogFormat};
use file43::queue::{BatchOutcome, QueueOrchestrator, SourceRef};
use file43::storage::{create_archive, OutputStore};
use file43::update::{check_for_updates, CURRENT_VERSION};
use file43::{reveal, FfmpegTranscoder, NamingPattern, QueueEvent, QueueEventKind};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = logging::init(log_format) {
        eprintln!("{}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> file43::Result<ExitCode> {
    let config = load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            files,
            format,
            naming,
        } => convert(&config, files, format, &naming).await,
        Commands::List => {
            list(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Zip { dest, names } => {
            zip(&config, &dest, names)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckUpdate => {
            let status = check_for_updates(&config.release_feed_url, CURRENT_VERSION).await?;
            println!("{}", status);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config_or_default(path: Option<&Path>) -> file43::Result<Config> {
    match path {
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(Config::default()),
    }
}

async fn convert(
    config: &Config,
    files: Vec<std::path::PathBuf>,
    format: Option<String>,
    naming: &str,
) -> file43::Result<ExitCode> {
    let preferences = PreferencesStore::default_location()
        .map(|store| store.load())
        .unwrap_or_default();

    let transcoder = Arc::new(FfmpegTranscoder::from_config(config));
    let queue = Arc::new(QueueOrchestrator::from_config(config, transcoder));

    queue.set_default_format(format.as_deref().unwrap_or(&preferences.default_format));
    queue.set_naming_pattern(NamingPattern::parse(naming));

    let printer = tokio::spawn(print_events(queue.subscribe()));

    let report = queue.admit(files.into_iter().map(SourceRef::from_path))?;
    if report.dropped_unsupported > 0 {
        tracing::warn!(
            "Ignored {} file(s) with unsupported extensions",
            report.dropped_unsupported
        );
    }

    let outcome = queue.run_all().await?;

    let summary = queue.summary();
    let jobs = queue.jobs();
    drop(queue);
    finish_printer(printer).await;

    println!(
        "Total: {}  Success: {}  Failed: {}  Elapsed: {}",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.elapsed_display()
    );
    for job in jobs.iter().filter(|j| j.is_failed()) {
        println!(
            "  {}: {}",
            job.source.name,
            job.error_detail().unwrap_or_default()
        );
    }

    if preferences.auto_open_output {
        if let Err(e) = reveal::reveal_directory(&config.output_path()) {
            tracing::warn!("Couldn't open output folder: {}", e);
        }
    }

    Ok(match outcome {
        BatchOutcome::CompletedWithErrors => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

/// Waits for the event printer. Returns false if it panicked or was cancelled.
async fn finish_printer(printer: tokio::task::JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Event printer failed: {}", e);
            false
        }
    }
}

async fn print_events(mut rx: tokio::sync::broadcast::Receiver<QueueEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => print_event(&event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Skipped {} queue events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &QueueEvent) {
    match &event.kind {
        QueueEventKind::JobsAdded { .. }
        | QueueEventKind::BatchStarted
        | QueueEventKind::BatchFinished { .. }
        | QueueEventKind::Rejected { .. } => println!("{}", event.status.message),
        QueueEventKind::JobUpdated { job } => {
            let label = job.status_label();
            println!("[{}] {} {}% {}", job.ordinal, job.source.name, job.progress, label);
        }
        _ => {}
    }
}

fn list(config: &Config) -> file43::Result<()> {
    let store = OutputStore::new(config.output_path());
    let artifacts = store.list()?;
    if artifacts.is_empty() {
        println!("No converted files yet.");
    }
    for artifact in artifacts {
        println!("{:>12}  {}", artifact.size, artifact.name);
    }
    Ok(())
}

fn zip(config: &Config, dest: &Path, names: Vec<String>) -> file43::Result<()> {
    let store = OutputStore::new(config.output_path());
    let names = if names.is_empty() {
        store.list()?.into_iter().map(|a| a.name).collect()
    } else {
        names
    };

    let (path, report) = create_archive(&store, &names, dest)?;
    println!(
        "Wrote {} ({} file(s), {} skipped)",
        path.display(),
        report.included.len(),
        report.skipped.len()
    );
    Ok(())
}
