//! Error taxonomy for the sign core.
//!
//! None of these are fatal to the tick loop. Bounds errors are programming
//! errors that renderers avoid by clipping; actuation and time-sync failures
//! are counted or logged and the sign keeps displaying whatever it can.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// A coordinate outside the dot grid was written.
    #[error("dot ({col}, {row}) is outside the {columns}x{rows} grid")]
    OutOfBounds {
        col: usize,
        row: usize,
        columns: usize,
        rows: usize,
    },

    /// A single dot failed to flip.
    #[error("actuating dot ({col}, {row}) failed: {reason}")]
    Actuation {
        col: usize,
        row: usize,
        reason: String,
    },

    /// The wall clock could not be synchronized within the retry budget.
    #[error("time synchronization failed after {attempts} attempts")]
    TimeSync { attempts: u32 },

    /// A frame with different dimensions was handed to the update engine.
    #[error("frame is {actual:?} but the sign is {expected:?} (columns, rows)")]
    FrameSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, SignError>;
