// In src/main.rs

// Declare modules
pub mod backends;
pub mod cli;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_loader;
pub mod keys;
pub mod orchestrator;

use crate::{
    backends::x11::XDriver,
    config::CONFIG,
    error::ViewerError,
    image_loader::ImageLoader,
    orchestrator::AppOrchestrator,
};

// Logging
use anyhow::Context;
use log::{debug, info};
use std::process::ExitCode;

/// Main entry point for the `sip` viewer.
fn main() -> ExitCode {
    // Quiet unless RUST_LOG asks for more; stdout stays untouched.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_micros()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let path = cli::parse_args(std::env::args_os())?;
    cli::check_openable(&path)?;
    info!("Starting sip for {}", path.display());

    if log::log_enabled!(log::Level::Debug) {
        match serde_json::to_string(&*CONFIG) {
            Ok(json) => debug!("Effective configuration: {}", json),
            Err(e) => debug!("Could not serialize configuration: {}", e),
        }
    }

    let mut driver = XDriver::connect()?;
    let loader = ImageLoader::new(path);
    let mut orchestrator = AppOrchestrator::new(&mut driver, loader, &CONFIG);
    orchestrator.run().context("event loop failed")?;

    info!("Quit requested. Exiting.");
    Ok(())
}

/// Prints `err` to stderr. Usage and open failures are shown bare;
/// everything else is prefixed with the program name.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ViewerError>() {
        Some(viewer_err @ (ViewerError::Usage | ViewerError::FileOpen { .. })) => {
            eprintln!("{}", viewer_err)
        }
        Some(viewer_err @ ViewerError::DisplayConnect { .. }) => eprintln!("sip: {}", viewer_err),
        _ => eprintln!("sip: {:#}", err),
    }
}
