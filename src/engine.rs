//! Diff-based update engine: the only code that pulses dots.
//!
//! Flipping a dot is a discrete mechanical event, so the engine remembers
//! what it last wrote (the *actuated state*) and only pulses dots whose
//! logical state changed. Dots are visited row by row, left to right, so the
//! order in which the sign visibly changes is always the same for the same
//! pair of frames.
//!
//! A failed pulse never stops a commit. The failed dot is counted, logged,
//! and remembered so the next commit pulses it again even if the frame did
//! not change there.
//!
//! ## Rust concepts
//! - Generic struct over a trait (`UpdateEngine<A: Actuator>`)
//! - `std::mem::take` to consume a one-shot flag

use crate::actuator::Actuator;
use crate::error::{Result, SignError};
use crate::frame::{DotState, Frame};
use serde::Serialize;

/// Aggregate outcome of one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CommitReport {
    /// Pulses issued, successful or not.
    pub actuated: usize,
    /// Pulses that reported a failure.
    pub failed: usize,
    /// Whether every dot was repainted.
    pub forced: bool,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct UpdateEngine<A> {
    actuator: A,
    actuated: Frame,
    /// Dots whose last pulse failed; pulsed again on the next commit.
    retry: Vec<bool>,
    desync_suspected: bool,
}

impl<A: Actuator> UpdateEngine<A> {
    /// Create an engine for a `columns x rows` sign.
    ///
    /// Nothing is known about the physical dots at power-on, so the first
    /// commit repaints everything.
    pub fn new(actuator: A, columns: usize, rows: usize) -> Self {
        Self {
            actuator,
            actuated: Frame::new(columns, rows),
            retry: vec![false; columns * rows],
            desync_suspected: true,
        }
    }

    /// Write `next` to the sign, pulsing only dots that differ from the
    /// actuated state unless `force_full` is set.
    ///
    /// The actuated state becomes a copy of `next` afterwards, including at
    /// dots whose pulse failed.
    pub fn commit(&mut self, next: &Frame, force_full: bool) -> Result<CommitReport> {
        if next.size() != self.actuated.size() {
            return Err(SignError::FrameSize {
                expected: self.actuated.size(),
                actual: next.size(),
            });
        }

        let forced = force_full || std::mem::take(&mut self.desync_suspected);
        let mut report = CommitReport {
            forced,
            ..CommitReport::default()
        };
        let columns = next.columns();

        for row in 0..next.rows() {
            for col in 0..columns {
                let index = row * columns + col;
                let want = next.is_set(col, row);
                let differs = want != self.actuated.is_set(col, row);
                if !(forced || differs || self.retry[index]) {
                    continue;
                }

                report.actuated += 1;
                match self.actuator.actuate(col, row, DotState::from(want)) {
                    Ok(()) => self.retry[index] = false,
                    Err(e) => {
                        report.failed += 1;
                        self.retry[index] = true;
                        tracing::warn!("Dot ({}, {}) did not flip: {}", col, row, e);
                    }
                }
            }
        }

        self.actuated.clone_from(next);

        if report.failed > 0 {
            tracing::warn!(
                "Commit finished with {} of {} pulses failed",
                report.failed,
                report.actuated
            );
        } else {
            tracing::debug!(
                actuated = report.actuated,
                forced = report.forced,
                "commit"
            );
        }
        Ok(report)
    }

    /// Distrust the actuated state: the next commit repaints every dot.
    pub fn request_full_repaint(&mut self) {
        self.desync_suspected = true;
    }

    pub fn full_repaint_pending(&self) -> bool {
        self.desync_suspected
    }

    /// The frame last written to the sign.
    pub fn actuated(&self) -> &Frame {
        &self.actuated
    }

    /// Number of dots waiting to be retried after a failed pulse.
    pub fn pending_retries(&self) -> usize {
        self.retry.iter().filter(|&&r| r).count()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}
