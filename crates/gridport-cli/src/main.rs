#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use gridport_export::export::Exporter;
use gridport_export::profile::ExportProfile;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Cli, Command, ExportArgs, ValidateArgs, log_export_config};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "gridport_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "gridport_cli::config";
pub const TRACING_TARGET_EXPORT: &str = "gridport_cli::export";

fn main() {
    let Err(error) = run() else {
        tracing::info!(
            target: TRACING_TARGET_EXPORT,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_EXPORT,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();
    log_startup_info();

    match cli.command {
        Command::Export(args) => export(&args),
        Command::Validate(args) => validate(&args),
    }
}

/// Runs the full pipeline and writes the workflow archive.
fn export(args: &ExportArgs) -> anyhow::Result<()> {
    log_export_config(args);

    let session = config::load_session(&args.session)?;
    let exporter = create_exporter(args.profile(), args.catalog.as_deref())?;

    if let Err(error) = exporter.export_to(&session, &args.output) {
        // A failed export may leave a half-written archive behind.
        remove_partial_output(&args.output);
        return Err(anyhow::Error::new(error).context("export failed"));
    }

    Ok(())
}

/// Runs every phase short of archive emission and reports the outcome.
fn validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let session = config::load_session(&args.session)?;
    let exporter = create_exporter(args.profile(), args.catalog.as_deref())?;

    let summary = exporter
        .validate(&session)
        .context("session does not validate")?;

    tracing::info!(
        target: TRACING_TARGET_EXPORT,
        jobs = summary.emitted_jobs,
        connections = summary.connections,
        payloads = summary.payloads,
        "session validates"
    );

    Ok(())
}

/// Creates the exporter, attaching a resource catalog when one is given.
fn create_exporter(profile: ExportProfile, catalog: Option<&Path>) -> anyhow::Result<Exporter> {
    let mut exporter = Exporter::new(profile);
    if let Some(path) = catalog {
        exporter = exporter.with_catalog(config::load_catalog(path)?);
    }
    Ok(exporter)
}

/// Best-effort removal of a partially written archive.
fn remove_partial_output(path: &Path) {
    if let Err(error) = std::fs::remove_file(path) {
        if error.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                target: TRACING_TARGET_EXPORT,
                path = %path.display(),
                error = %error,
                "could not remove partial output"
            );
        }
    }
}

/// Initializes tracing with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs startup information.
fn log_startup_info() {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting gridport"
    );

    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        "build information"
    );
}
