//! Flipdot sign controller.
//!
//! The core turns logical frames into the smallest set of dot flips:
//! - `frame`: the dot grid and its mutation primitives
//! - `font`: built-in 3x5 and 4x5 bitmap fonts and the text renderer
//! - `engine`: the diff-based update engine, the only code that pulses dots
//! - `scroll`: the horizontal scroll sequencer
//! - `clock`: the minute-boundary clock face and time sync plumbing
//! - `scheduler`: the mode state machine and the `tick()` entry point
//!
//! The render thread and the HTTP control API used by the binary live in
//! `render` and `server`.

pub mod actuator;
pub mod clock;
pub mod engine;
pub mod error;
pub mod font;
pub mod frame;
pub mod render;
pub mod scheduler;
pub mod scroll;
pub mod server;

pub use error::{Result, SignError};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Sign configuration ─────────────────────────────────────────────

/// Dimensions of the dot grid, fixed for the life of the process.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's just two usizes), so it
/// can be handed to every component that needs the geometry without
/// any shared global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignConfig {
    pub columns: usize,
    pub rows: usize,
}

impl SignConfig {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    /// Total number of dots on the sign.
    pub fn dot_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        col < self.columns && row < self.rows
    }
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            columns: 28,
            rows: 14,
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// The render thread and the HTTP server both watch this flag. `Arc` lets
/// them share it; `AtomicBool` makes reads and writes safe without a mutex.
pub fn setup_signal_handler() -> std::result::Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn sign_config_default_is_28x14() {
        let config = SignConfig::default();
        assert_eq!(config.columns, 28);
        assert_eq!(config.rows, 14);
    }

    #[rstest]
    #[case(16, 9, 144)]
    #[case(28, 14, 392)]
    #[case(28, 7, 196)]
    #[case(0, 7, 0)]
    fn test_dot_count(#[case] columns: usize, #[case] rows: usize, #[case] expected: usize) {
        assert_eq!(SignConfig::new(columns, rows).dot_count(), expected);
    }

    #[rstest]
    #[case(0, 0, true)]
    #[case(15, 8, true)]
    #[case(16, 8, false)]
    #[case(15, 9, false)]
    fn test_contains(#[case] col: usize, #[case] row: usize, #[case] expected: bool) {
        assert_eq!(SignConfig::new(16, 9).contains(col, row), expected);
    }

    #[test]
    fn running_flag_reads_through() {
        let flag = AtomicBool::new(true);
        assert!(is_running(&flag));
        flag.store(false, Ordering::SeqCst);
        assert!(!is_running(&flag));
    }
}
