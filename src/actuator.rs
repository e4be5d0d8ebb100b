//! The boundary to the physical dot driver.
//!
//! The update engine is the only caller of [`Actuator::actuate`]. Real
//! hardware implements the trait on top of its coil driver; the
//! [`SimulatedPanel`] here stands in for it when no sign is attached and
//! keeps its own record of what the dots would physically show.

use crate::SignConfig;
use crate::error::{Result, SignError};
use crate::frame::{DotState, Frame};
use std::path::Path;

/// Pulses one dot into a target state.
///
/// # Rust concept: traits at the hardware seam
/// The engine is generic over this trait, so tests can substitute a
/// recording fake and the binary can use a simulator, without the engine
/// knowing which one it talks to.
pub trait Actuator {
    /// Flip the dot at `(col, row)` to `state`. May fail per dot.
    fn actuate(&mut self, col: usize, row: usize, state: DotState) -> Result<()>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn actuate(&mut self, col: usize, row: usize, state: DotState) -> Result<()> {
        (**self).actuate(col, row, state)
    }
}

/// A software sign: applies every pulse to an in-memory frame.
#[derive(Debug, Clone)]
pub struct SimulatedPanel {
    physical: Frame,
    pulses: u64,
}

impl SimulatedPanel {
    pub fn new(config: SignConfig) -> Self {
        Self {
            physical: Frame::for_sign(config),
            pulses: 0,
        }
    }

    /// What the dots are physically showing.
    pub fn physical(&self) -> &Frame {
        &self.physical
    }

    /// Total pulses applied since creation.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// Write a PNG preview of the physical dots.
    pub fn save_png(&self, path: &Path, scale: u32) -> std::result::Result<(), image::ImageError> {
        self.physical.to_image(scale).save(path)
    }
}

impl Actuator for SimulatedPanel {
    fn actuate(&mut self, col: usize, row: usize, state: DotState) -> Result<()> {
        if self.physical.get(col, row).is_none() {
            return Err(SignError::Actuation {
                col,
                row,
                reason: "no such dot on the panel".to_string(),
            });
        }
        match state {
            DotState::Set => self.physical.set_dot(col, row)?,
            DotState::Unset => self.physical.unset_dot(col, row)?,
        }
        self.pulses += 1;
        tracing::trace!(col, row, ?state, "pulse");
        Ok(())
    }
}
