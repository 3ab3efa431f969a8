//! HERD topology editor entry point.
//!
//! Loads the editor configuration, restores the stored canvas into a fresh
//! editing session, and keeps the session's persistence pump running until
//! Ctrl-C.  The canvas frontend drives the session through the commands in
//! `infrastructure::ui_bridge`.
//!
//! # Usage
//!
//! ```text
//! herd-editor [OPTIONS]
//!
//! Options:
//!   --config     <PATH>   Editor config file [default: platform config dir]
//!   --canvas-dir <DIR>    Directory holding herd-topology.json
//!   --log-level  <LEVEL>  error | warn | info | debug | trace
//! ```
//!
//! `RUST_LOG` takes precedence over both `--log-level` and the config file.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load EditorConfig        -- TOML, defaults when absent
//!  └─ AppState::new()          -- FileCanvasStore + EditorSession::start()
//!  └─ tick loop                -- EditorSession::tick() flushes debounced saves
//!  └─ shutdown                 -- EditorSession::flush() writes what is pending
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use herd_editor::application::reserve::LoggingReservationFlow;
use herd_editor::infrastructure::storage::config::{config_file_path, load_config_from, EditorConfig};
use herd_editor::infrastructure::ui_bridge::AppState;

/// Interval of the persistence pump.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// HERD lab topology editor.
#[derive(Debug, Parser)]
#[command(
    name = "herd-editor",
    about = "Topology graph editor for HERD lab equipment",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long, env = "HERD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the persisted canvas; overrides the config file.
    #[arg(long, env = "HERD_CANVAS_DIR")]
    canvas_dir: Option<PathBuf>,

    /// Log level; overrides the config file.
    #[arg(long, env = "HERD_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    ///
    /// Also returns the config file path, where settings changes are saved.
    fn into_editor_config(self) -> anyhow::Result<(PathBuf, EditorConfig)> {
        let path = match self.config {
            Some(path) => path,
            None => config_file_path().context("no --config given and no platform config dir")?,
        };
        let mut config = load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if let Some(dir) = self.canvas_dir {
            config.persistence.canvas_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            config.editor.log_level = level;
        }
        Ok((path, config))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config_path, config) = Cli::parse().into_editor_config()?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    let default_level = config.editor.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("HERD topology editor starting");

    let state = AppState::new(config, Some(config_path), Arc::new(LoggingReservationFlow))
        .context("failed to initialise editing session")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl-C signal: {e}"),
        }
    });

    {
        let config = state.config.lock().await;
        info!(
            debounce_ms = config.persistence.debounce_ms,
            layer = %config.editor.default_edge_layer,
            "HERD topology editor ready.  Press Ctrl-C to exit."
        );
    }

    // ── Persistence pump ──────────────────────────────────────────────────────
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(TICK_INTERVAL).await;
        state.session.lock().await.tick(Instant::now());
    }

    state.session.lock().await.flush();
    info!("HERD topology editor stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
