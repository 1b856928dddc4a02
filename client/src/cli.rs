//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::logs::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "buildrun")]
#[command(version, about = "Build and containerize a project on a remote build service")]
pub struct Cli {
    /// Settings file; defaults to $BUILDRUN_HOME/settings.json
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Build service API base URL
    #[arg(long, global = true, env = "BUILDRUN_BASE_URL", value_parser = parse_base_url)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a Dockerfile and project archive, following the build logs
    Submit(SubmitArgs),
    /// Follow the build log stream until interrupted
    Logs,
    /// Print version and build information
    Version,
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Name of the image to build
    #[arg(long)]
    pub image_name: String,

    /// Port the container exposes
    #[arg(long)]
    pub endpoint: u16,

    /// Path to the Dockerfile; the file must be named exactly "Dockerfile"
    #[arg(long, value_name = "PATH")]
    pub dockerfile: Option<PathBuf>,

    /// Path to the zipped project
    #[arg(long, value_name = "PATH")]
    pub archive: Option<PathBuf>,

    /// Ask the completion service for a fix when the build fails
    #[arg(long)]
    pub solve: bool,

    /// Write the collected build logs to DIR/logs.txt
    #[arg(long, value_name = "DIR")]
    pub save_logs: Option<PathBuf>,

    /// Print the full log again with the result instead of a line count
    #[arg(long)]
    pub full_logs: bool,
}

fn parse_base_url(value: &str) -> Result<String, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL '{}': {}", value, e))?;
    match url.scheme() {
        "http" | "https" => Ok(value.trim_end_matches('/').to_string()),
        scheme => Err(format!("unsupported scheme '{}'", scheme)),
    }
}
