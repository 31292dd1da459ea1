mod args;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tubefetch_core::{
    load_config, load_config_or_default, validate_config, ArtifactDownloader, Config,
    HttpJobService, JobOrchestrator, JobOutcome, JobRequest, JobService, JobState,
};

use args::Args;
use render::ProgressView;

/// Exit code after the user interrupted the job.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_json);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load(args: &Args) -> Result<Config> {
    let (config_path, explicit) = args.config_path();
    info!("Loading configuration from {:?}", config_path);

    let mut config = if explicit {
        load_config(&config_path)
    } else {
        load_config_or_default(&config_path)
    }
    .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    if let Some(server) = &args.server {
        config.service.base_url = server.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load(&args)?;
    let format = args.format.unwrap_or(config.output.default_format);
    let request = JobRequest::new(args.url.as_str(), format);

    let service: Arc<dyn JobService> = Arc::new(
        HttpJobService::new(config.service.clone()).context("Failed to create HTTP client")?,
    );
    info!("Using {} job service at {}", service.name(), config.service.base_url);

    // The callback hands the artifact name to the retrieval step below.
    let (completed_tx, mut completed_rx) = mpsc::unbounded_channel::<String>();
    let orchestrator = JobOrchestrator::new(Arc::clone(&service), &config.service)
        .with_completion_callback(Arc::new(move |file_path: &str| {
            info!("Job produced {}", file_path);
            let _ = completed_tx.send(file_path.to_string());
        }));

    let view = if args.json {
        ProgressView::json()
    } else {
        ProgressView::bars()?
    };

    let mut updates = orchestrator.subscribe();
    let handle = orchestrator
        .submit(request)
        .await
        .context("Could not submit job")?;
    debug!("Submitted job {}", handle.id());

    let outcome = handle.outcome();
    tokio::pin!(outcome);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut cancelling = false;

    let mut last_shown: Option<JobState> = None;
    let outcome = loop {
        tokio::select! {
            biased;
            update = updates.recv() => match update {
                Ok(update) => show(&view, update.state, &mut last_shown)?,
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {} progress updates", skipped),
                Err(RecvError::Closed) => break (&mut outcome).await,
            },
            outcome = &mut outcome => break outcome,
            _ = &mut shutdown, if !cancelling => {
                cancelling = true;
                orchestrator.cancel().await;
            }
        }
    };

    // Updates published before the outcome may still be queued.
    loop {
        match updates.try_recv() {
            Ok(update) => show(&view, update.state, &mut last_shown)?,
            Err(TryRecvError::Lagged(skipped)) => debug!("Skipped {} progress updates", skipped),
            Err(_) => break,
        }
    }

    let final_state = orchestrator.state().await;
    let already_shown = last_shown.as_ref() == Some(&final_state);
    view.finish(&final_state, already_shown)?;

    match outcome {
        JobOutcome::Succeeded { .. } => {
            let file_path = completed_rx
                .try_recv()
                .context("Job succeeded without reporting its file")?;
            if args.no_save {
                report(&args, &file_path, None)?;
                return Ok(ExitCode::SUCCESS);
            }

            let downloader = ArtifactDownloader::new(service, &config.output.dir);
            info!("Saving {} into {:?}", file_path, downloader.output_dir());
            let saved = downloader
                .save(&file_path)
                .await
                .with_context(|| format!("Failed to save {}", file_path))?;
            report(&args, &saved.path.display().to_string(), Some(saved.size_bytes))?;
            Ok(ExitCode::SUCCESS)
        }
        JobOutcome::Failed { message } => {
            eprintln!("Error: {}", message);
            Ok(ExitCode::FAILURE)
        }
        JobOutcome::Cancelled => {
            eprintln!("Cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
    }
}

fn show(view: &ProgressView, state: JobState, last_shown: &mut Option<JobState>) -> Result<()> {
    view.render(&state)?;
    *last_shown = Some(state);
    Ok(())
}

fn report(args: &Args, path: &str, size_bytes: Option<u64>) -> Result<()> {
    if args.json {
        let line = serde_json::json!({ "path": path, "size_bytes": size_bytes });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        match size_bytes {
            Some(size) => println!("Saved {} ({} bytes)", path, size),
            None => println!("{}", path),
        }
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            debug!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                debug!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
