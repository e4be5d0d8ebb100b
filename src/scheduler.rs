//! Top-level sign state: which producer runs on each tick.
//!
//! A [`Sign`] owns every piece of mutable core state (working frame, update
//! engine, scroll cursor, clock producer, mode). Whoever holds the `Sign`
//! is the single writer, so none of it needs locking; the render thread
//! owns it for the life of the process.

use crate::SignConfig;
use crate::actuator::Actuator;
use crate::clock::{ClockProducer, SyncOutcome, SyncPolicy, TimeSource, TimeSync, await_time_sync};
use crate::engine::{CommitReport, UpdateEngine};
use crate::font::FontSize;
use crate::frame::Frame;
use crate::scroll::ScrollSequencer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top row of the scrolling message.
pub const SCROLL_ROW: i32 = 4;

/// What the sign is showing.
///
/// # Rust concept: exhaustive match
/// Every `match` on `Mode` must handle every variant, so adding a mode
/// fails to compile until each dispatch site knows about it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Scroll,
    Clock,
}

impl Mode {
    /// The mode a button press moves to.
    pub fn next(self) -> Mode {
        match self {
            Mode::Scroll => Mode::Clock,
            Mode::Clock => Mode::Scroll,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Scroll => "scroll",
            Mode::Clock => "clock",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scroll" => Ok(Mode::Scroll),
            "clock" => Ok(Mode::Clock),
            other => Err(format!("unknown mode '{other}' (expected scroll or clock)")),
        }
    }
}

pub struct Sign<A, T> {
    config: SignConfig,
    frame: Frame,
    engine: UpdateEngine<A>,
    scroll: ScrollSequencer,
    clock: ClockProducer,
    time: T,
    mode: Mode,
    ticks: u64,
    clock_sync: Option<SyncOutcome>,
}

impl<A: Actuator, T: TimeSource> Sign<A, T> {
    /// Build the sign state. Call once at startup, before the first tick.
    pub fn init(config: SignConfig, actuator: A, time: T, message: &str, font: FontSize) -> Self {
        tracing::info!(
            "Sign {}x{}, scrolling {:?} with {:?}",
            config.columns,
            config.rows,
            message,
            font
        );
        Self {
            config,
            frame: Frame::for_sign(config),
            engine: UpdateEngine::new(actuator, config.columns, config.rows),
            scroll: ScrollSequencer::new(message, font, SCROLL_ROW, config.columns),
            clock: ClockProducer::new(),
            time,
            mode: Mode::default(),
            ticks: 0,
            clock_sync: None,
        }
    }

    /// Block until the wall clock is trustworthy, or the policy runs out.
    ///
    /// Does nothing when the clock already reads a plausible year.
    pub fn ensure_clock_synchronized<S>(&mut self, sync: S, policy: SyncPolicy) -> SyncOutcome
    where
        S: TimeSync + Send + 'static,
    {
        let outcome = if self.time.current_wall_time().is_synchronized() {
            SyncOutcome::AlreadySet
        } else {
            tracing::info!("Time is not set yet. Waiting for time synchronization.");
            await_time_sync(sync, policy)
        };
        self.clock_sync = Some(outcome);
        outcome
    }

    /// Switch producers. Returns `false` if `mode` was already active.
    ///
    /// The previous mode's dots must not survive as diff-skipped leftovers,
    /// so a transition always repaints the whole sign.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        tracing::info!("Mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.request_full_repaint();
        true
    }

    /// Distrust the physical dots and repaint everything on the next tick.
    pub fn request_full_repaint(&mut self) {
        self.engine.request_full_repaint();
        if self.mode == Mode::Clock {
            self.clock.arm();
        }
    }

    /// Run the active producer once. Returns what was committed, if anything.
    ///
    /// Never fails: a producer error is logged and turned into a full
    /// repaint on the next tick.
    pub fn tick(&mut self) -> Option<CommitReport> {
        self.ticks += 1;
        let result = match self.mode {
            Mode::Scroll => self
                .scroll
                .advance(&mut self.frame, &mut self.engine)
                .map(Some),
            Mode::Clock => {
                let now = self.time.current_wall_time();
                self.clock.tick(now, &mut self.frame, &mut self.engine)
            }
        };

        match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Tick {} failed: {}", self.ticks, e);
                self.request_full_repaint();
                None
            }
        }
    }

    pub fn config(&self) -> SignConfig {
        self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scroll_cursor(&self) -> i32 {
        self.scroll.cursor()
    }

    pub fn message(&self) -> &str {
        self.scroll.message()
    }

    pub fn minutes_shown(&self) -> u64 {
        self.clock.minutes_shown()
    }

    pub fn clock_sync(&self) -> Option<SyncOutcome> {
        self.clock_sync
    }

    pub fn engine(&self) -> &UpdateEngine<A> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut UpdateEngine<A> {
        &mut self.engine
    }
}
