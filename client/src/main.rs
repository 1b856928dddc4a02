//! buildrun - Entry Point
//!
//! Submits a Dockerfile and zipped project to the build service, follows the
//! build logs and prints the result.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use buildrun::app::options::{AppOptions, API_KEY_ENV};
use buildrun::app::run::Session;
use buildrun::cli::{Cli, Commands, SubmitArgs};
use buildrun::errors::ClientError;
use buildrun::filesys::file::File;
use buildrun::form::{validate, FormState, Upload};
use buildrun::logs::init_logging;
use buildrun::render::terminal::{write_log_line, write_view, LogDisplay};
use buildrun::render::view::GENERATING_LABEL;
use buildrun::render::render;
use buildrun::storage::layout::StorageLayout;
use buildrun::storage::settings::load_settings;
use buildrun::utils::version_info;
use buildrun::workers::follower;

use clap::Parser;
use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Exit status after an interrupt
const INTERRUPTED: u8 = 130;

/// Exit status for arguments rejected before any request is sent
const INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Print version and exit
    let command = match cli.command {
        Commands::Version => {
            return match serde_json::to_string_pretty(&version_info()) {
                Ok(version) => {
                    println!("{}", version);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to serialize version info: {e}");
                    ExitCode::FAILURE
                }
            };
        }
        command => command,
    };

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = cli
        .config
        .map(File::new)
        .unwrap_or_else(|| layout.settings_file());
    let settings = match load_settings(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "Unable to read settings file {}: {}",
                settings_file.path().display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let options = AppOptions::from_settings(&settings, &layout, std::env::var(API_KEY_ENV).ok())
        .with_base_url(cli.base_url)
        .with_log_level(cli.log_level);

    // Initialize logging
    let _log_guard = match init_logging(options.logging.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    info!("Running buildrun with options: {:?}", options);
    let result = match command {
        Commands::Submit(args) => submit(args, options).await,
        Commands::Logs => follow_logs(options).await,
        Commands::Version => Ok(ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("buildrun failed: {e}");
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn submit(args: SubmitArgs, options: AppOptions) -> Result<ExitCode, ClientError> {
    let mut form = FormState::new(args.image_name, args.endpoint.to_string());
    form.select_dockerfile(load_upload(args.dockerfile.as_deref()).await?);
    form.select_archive(load_upload(args.archive.as_deref()).await?);

    let request = match validate(&mut form) {
        Ok(request) => request,
        Err(e) => {
            info!("Submission rejected: {:?}", e);
            if let Some(message) = form.archive_error() {
                eprintln!("{} {}", "--archive:".bold(), message.red());
            }
            if let Some(message) = form.dockerfile_error() {
                eprintln!("{} {}", "--dockerfile:".bold(), message.red());
            }
            return Ok(ExitCode::from(INVALID_INPUT));
        }
    };

    let drain_delay = options.lifecycle.log_drain_delay;
    let session = Session::mount(options).await?;
    let printer = spawn_printer(&session);

    let task = session.start_submission(request).await;
    let outcome = tokio::select! {
        outcome = task.wait() => outcome,
        _ = await_shutdown_signal() => None,
    };

    let Some(outcome) = outcome else {
        warn!("Submission interrupted");
        session.unmount().await?;
        join_printer(printer).await;
        return Ok(ExitCode::from(INTERRUPTED));
    };

    // Trailing lines may still be in flight when the response lands
    tokio::time::sleep(drain_delay).await;

    if !outcome.is_success() && args.solve {
        eprintln!("{}", GENERATING_LABEL.dimmed());
        tokio::select! {
            _ = session.generate_solution() => {}
            _ = await_shutdown_signal() => {
                warn!("Solution request interrupted");
            }
        }
    }

    let snapshot = session.snapshot().await;
    session.unmount().await?;
    join_printer(printer).await;

    let view = render(&snapshot);
    let display = if args.full_logs {
        LogDisplay::Full
    } else {
        LogDisplay::Summary
    };
    {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        write_view(&mut out, &view, display)?;
    }

    if let (Some(dir), Some(region)) = (args.save_logs.as_deref(), view.logs.as_ref()) {
        let file = File::new(dir.join(region.download.file_name));
        file.write_string(&region.download.contents).await?;
        println!("Logs saved to {}", file.path().display());
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn follow_logs(options: AppOptions) -> Result<ExitCode, ClientError> {
    let session = Session::mount(options).await?;
    let printer = spawn_printer(&session);

    await_shutdown_signal().await;

    session.unmount().await?;
    join_printer(printer).await;
    Ok(ExitCode::SUCCESS)
}

async fn load_upload(path: Option<&Path>) -> Result<Option<Upload>, ClientError> {
    match path {
        Some(path) => Ok(Some(Upload::from_file(&File::new(path)).await?)),
        None => Ok(None),
    }
}

fn spawn_printer(session: &Session) -> JoinHandle<()> {
    tokio::spawn(follower::run(
        session.logs(),
        |line| {
            let mut out = io::stdout().lock();
            if let Err(e) = write_log_line(&mut out, line) {
                warn!("Failed to print log line: {}", e);
            }
        },
        session.shutdown_signal(),
    ))
}

async fn join_printer(printer: JoinHandle<()>) {
    if let Err(e) = printer.await {
        warn!("Log printer stopped abnormally: {}", e);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = sigint.recv() => {
                        info!("SIGINT received, shutting down...");
                    }
                }
            }
            _ => {
                warn!("Unable to install signal handlers, falling back to Ctrl+C");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
    }
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, shutting down..."),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
