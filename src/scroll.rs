//! Horizontal scrolling of a fixed message.
//!
//! The cursor is the column of the message's left edge. It starts just past
//! the right edge of the sign, moves one column left per `advance()`, and
//! jumps back once the whole message has left on the left side.

use crate::actuator::Actuator;
use crate::engine::{CommitReport, UpdateEngine};
use crate::error::Result;
use crate::font::{FontSize, render_text, text_width};
use crate::frame::Frame;

#[derive(Debug, Clone)]
pub struct ScrollSequencer {
    message: String,
    font: FontSize,
    row: i32,
    columns: i32,
    cursor: i32,
}

impl ScrollSequencer {
    pub fn new(message: impl Into<String>, font: FontSize, row: i32, columns: usize) -> Self {
        let columns = columns as i32;
        Self {
            message: message.into(),
            font,
            row,
            columns,
            cursor: columns,
        }
    }

    /// Paint the message at the cursor, commit it, then step the cursor.
    pub fn advance<A: Actuator>(
        &mut self,
        frame: &mut Frame,
        engine: &mut UpdateEngine<A>,
    ) -> Result<CommitReport> {
        frame.clear();
        render_text(frame, self.cursor, self.row, &self.message, self.font);
        let report = engine.commit(frame, false)?;

        self.cursor -= 1;
        if self.cursor == -text_width(&self.message, self.font) {
            self.cursor = self.columns;
        }
        Ok(report)
    }

    /// Current left edge of the message, in sign columns.
    pub fn cursor(&self) -> i32 {
        self.cursor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of `advance()` calls before the cursor comes back around.
    pub fn cycle_length(&self) -> usize {
        (self.columns + text_width(&self.message, self.font)) as usize
    }
}
