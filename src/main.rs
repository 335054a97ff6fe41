mod activity;
mod app;
mod config;
mod notify;
mod paths;
mod shutdown;
mod system;
mod tracker;
mod tui;
mod utils;

use activity::ActivityClock;
use anyhow::{Context, Result};
use app::{App, Flow};
use clap::Parser;
use config::Config;
use fd_lock::RwLock;
use notify::Presenter;
use shutdown::{Executor, SystemPowerOff};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idle-shutdown")]
#[command(version)]
#[command(
    about = "Shuts the computer down after 1 minute without input and 3 more minutes without confirmation",
    long_about = None
)]
struct Cli {}

fn main() -> Result<()> {
    Cli::parse();

    let base_dir = paths::base_dir()?;
    init_logging(&paths::log_path(&base_dir))?;
    info!("idle-shutdown v{} starting", env!("CARGO_PKG_VERSION"));

    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(paths::lock_path(&base_dir))?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.try_write().map_err(|_| {
        anyhow::anyhow!("Another instance of idle-shutdown is already running.")
    })?;

    let close_requested = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&close_requested);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Failed to install the interrupt handler")?;

    let clock = Arc::new(ActivityClock::new(Instant::now()));
    let listener_errors = activity::spawn_listener(Arc::clone(&clock));
    let inputs = tui::Inputs {
        clock,
        listener_errors,
        close_requested,
    };

    let config = Config::default();
    let presenter = Presenter::new(config.notification_ttl).with_desktop();
    let mut app = App::new(config, presenter);
    let mut executor = Executor::new(SystemPowerOff);

    match tui::run_tui(&mut app, &inputs)? {
        Flow::Shutdown => executor.execute(),
        Flow::Continue => warn!("Main window closed without a shutdown"),
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("idle_shutdown=info"))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(())
}
