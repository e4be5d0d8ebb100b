//! Flipdot sign controller
//!
//! Drives a flipdot sign from a dedicated render thread and exposes a small
//! HTTP API on the LAN for switching between the scrolling message and the
//! clock, forcing a repaint, and previewing the dots.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the sign, ticks once per interval
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! ## Usage
//! ```sh
//! ./target/release/flipdot-sign --columns 28 --rows 14 --message "HELLO" --port 8080
//! ```

use clap::Parser;
use flipdot_sign::actuator::SimulatedPanel;
use flipdot_sign::clock::{HostClockSync, LocalClock, SyncPolicy};
use flipdot_sign::font::FontSize;
use flipdot_sign::render::{SignStatus, render_loop};
use flipdot_sign::scheduler::{Mode, Sign};
use flipdot_sign::server::{self, AppState};
use flipdot_sign::{SignConfig, is_running, setup_signal_handler};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Flipdot sign controller
#[derive(Parser)]
#[command(name = "flipdot-sign")]
#[command(about = "Drive a flipdot sign with an HTTP control API")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Number of dot columns on the sign
    #[arg(long, default_value = "28")]
    columns: usize,

    /// Number of dot rows on the sign
    #[arg(long, default_value = "14")]
    rows: usize,

    /// Message to scroll in scroll mode
    #[arg(long, default_value = "HELLO WORLD")]
    message: String,

    /// Font for the scrolling message (3x5 or 4x5)
    #[arg(long, default_value = "4x5")]
    font: FontSize,

    /// Mode to start in (scroll or clock)
    #[arg(long, default_value = "scroll")]
    mode: Mode,

    /// Milliseconds between ticks
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Show UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Seconds to wait between time sync attempts
    #[arg(long, default_value = "2")]
    sync_timeout_secs: u64,

    /// Time sync attempts before carrying on with unsynchronized time
    #[arg(long, default_value = "10")]
    sync_retries: u32,

    /// Write a PNG of the simulated sign here on shutdown
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let config = SignConfig::new(args.columns, args.rows);
    let clock = if args.utc {
        LocalClock::utc()
    } else {
        LocalClock::local()
    };
    let sync_policy = SyncPolicy {
        timeout: Duration::from_secs(args.sync_timeout_secs),
        max_retries: args.sync_retries,
    };

    tracing::info!("Flipdot sign controller v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Sign: {}x{}", config.columns, config.rows);
    tracing::info!("Tick: {}ms", args.tick_ms);
    tracing::info!("Port: {}", args.port);

    let running = setup_signal_handler()?;

    let mut sign = Sign::init(config, SimulatedPanel::new(config), clock, &args.message, args.font);
    sign.set_mode(args.mode);

    // Channel for mode changes from the HTTP side to the render thread.
    let (tx, rx) = mpsc::channel();

    // Shared sign status: render thread writes, HTTP handlers read.
    let status = Arc::new(Mutex::new(SignStatus::new(config.columns, config.rows)));

    let render_status = status.clone();
    let render_running = running.clone();
    let tick_interval = Duration::from_millis(args.tick_ms.max(1));
    let render_handle = std::thread::Builder::new()
        .name("render".to_string())
        .spawn(move || {
            render_loop(
                sign,
                rx,
                render_status,
                render_running,
                tick_interval,
                HostClockSync::new(clock),
                sync_policy,
            )
        })?;

    let app = server::create_router(AppState {
        command_tx: tx,
        status,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl -X POST http://localhost:{}/api/v1/mode/next", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_stop(running))
        .await?;

    match render_handle.join() {
        Ok(sign) => {
            if let Some(path) = args.snapshot {
                sign.engine().actuator().save_png(&path, 8)?;
                tracing::info!("Wrote sign snapshot to {}", path.display());
            }
        }
        Err(_) => tracing::error!("Render thread panicked"),
    }

    tracing::info!("Shutting down cleanly.");
    Ok(())
}

/// Resolve once Ctrl+C has cleared the running flag.
async fn wait_for_stop(running: Arc<AtomicBool>) {
    while is_running(&running) {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
