//! Render thread: owns the sign and runs the tick loop.
//!
//! All core state lives in one `Sign`, and only this thread touches it. The
//! async HTTP server talks to it by sending `SignCommand` values through an
//! `mpsc` channel; commands are applied between ticks, so a tick never
//! overlaps another tick or a mode change.
//!
//! ## Rust concepts
//! - `std::sync::mpsc` channels for thread communication
//! - `recv_timeout()` as both the tick timer and the command wait
//! - `Arc<Mutex<T>>` for status shared with the HTTP handlers

use crate::actuator::Actuator;
use crate::clock::{SyncOutcome, SyncPolicy, TimeSource, TimeSync};
use crate::engine::CommitReport;
use crate::frame::Frame;
use crate::is_running;
use crate::scheduler::{Mode, Sign};
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ── Commands ─────────────────────────────────────────────────────────

/// Requests applied by the render thread between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignCommand {
    /// Switch to a specific mode.
    SetMode(Mode),
    /// Button edge: move to the next mode.
    NextMode,
    /// Suspected desync (e.g. after a power glitch): repaint every dot.
    Repaint,
}

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot of the sign that the HTTP server reads.
#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct SignStatus {
    /// Active mode
    pub mode: Mode,
    /// Ticks run so far
    pub ticks: u64,
    /// Sign width in dots
    pub columns: usize,
    /// Sign height in dots
    pub rows: usize,
    /// Scrolling message
    pub message: String,
    /// Left edge of the scrolling message
    pub scroll_cursor: i32,
    /// Most recent commit, if any tick has committed yet
    pub last_commit: Option<CommitReport>,
    /// Pulses issued since startup
    pub total_actuations: u64,
    /// Pulses that failed since startup
    pub failed_actuations: u64,
    /// Dots waiting to be pulsed again after a failure
    pub pending_retries: usize,
    /// Clock faces painted at a minute boundary
    pub minutes_shown: u64,
    /// Result of the startup clock check
    pub clock_sync: Option<SyncOutcome>,
    /// Server version
    pub version: String,
    /// What the engine last wrote to the dots
    #[serde(skip)]
    pub frame: Frame,
}

impl SignStatus {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            mode: Mode::default(),
            ticks: 0,
            columns,
            rows,
            message: String::new(),
            scroll_cursor: columns as i32,
            last_commit: None,
            total_actuations: 0,
            failed_actuations: 0,
            pending_retries: 0,
            minutes_shown: 0,
            clock_sync: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            frame: Frame::new(columns, rows),
        }
    }

    /// Fold a tick's outcome and the sign's current state into the snapshot.
    pub fn record<A: Actuator, T: TimeSource>(
        &mut self,
        sign: &Sign<A, T>,
        report: Option<CommitReport>,
    ) {
        if let Some(report) = report {
            self.total_actuations += report.actuated as u64;
            self.failed_actuations += report.failed as u64;
            self.last_commit = Some(report);
            self.frame.clone_from(sign.engine().actuated());
        }
        self.mode = sign.mode();
        self.ticks = sign.ticks();
        self.message = sign.message().to_string();
        self.scroll_cursor = sign.scroll_cursor();
        self.pending_retries = sign.engine().pending_retries();
        self.minutes_shown = sign.minutes_shown();
        self.clock_sync = sign.clock_sync();
    }
}

/// Apply one command to the sign.
pub fn apply_command<A: Actuator, T: TimeSource>(sign: &mut Sign<A, T>, cmd: SignCommand) {
    match cmd {
        SignCommand::SetMode(mode) => {
            sign.set_mode(mode);
        }
        SignCommand::NextMode => {
            let next = sign.mode().next();
            sign.set_mode(next);
        }
        SignCommand::Repaint => {
            tracing::info!("Full repaint requested");
            sign.request_full_repaint();
        }
    }
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop. Runs on a dedicated thread and owns the sign.
///
/// Waits for the wall clock first (bounded by `sync_policy`), then ticks
/// every `tick_interval` until `running` goes false or every command
/// sender is dropped. Hands the sign back when it stops.
pub fn render_loop<A, T, S>(
    mut sign: Sign<A, T>,
    rx: Receiver<SignCommand>,
    status: Arc<Mutex<SignStatus>>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
    sync: S,
    sync_policy: SyncPolicy,
) -> Sign<A, T>
where
    A: Actuator,
    T: TimeSource,
    S: TimeSync + Send + 'static,
{
    let outcome = sign.ensure_clock_synchronized(sync, sync_policy);
    tracing::info!("Clock check: {:?}", outcome);
    publish(&status, &sign, None);

    tracing::info!("Render thread started, ticking every {:?}", tick_interval);
    let mut next_tick = Instant::now();

    while is_running(&running) {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(cmd) => {
                apply_command(&mut sign, cmd);
                publish(&status, &sign, None);
                // A busy channel must not hold back a due tick.
                if Instant::now() < next_tick {
                    continue;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Render thread: channel closed, shutting down.");
                break;
            }
        }

        let report = sign.tick();
        publish(&status, &sign, report);

        next_tick += tick_interval;
        // Fell behind (e.g. a slow repaint): resume the cadence from now.
        if next_tick < Instant::now() {
            next_tick = Instant::now() + tick_interval;
        }
    }

    tracing::info!("Render thread stopped after {} ticks", sign.ticks());
    sign
}

fn publish<A: Actuator, T: TimeSource>(
    status: &Mutex<SignStatus>,
    sign: &Sign<A, T>,
    report: Option<CommitReport>,
) {
    match status.lock() {
        Ok(mut s) => s.record(sign, report),
        Err(poisoned) => poisoned.into_inner().record(sign, report),
    }
}
