//! The dot grid: one logical snapshot of which dots should show.
//!
//! A `Frame` is a fixed `columns x rows` grid stored as a single contiguous
//! buffer in row-major order. Frames are allocated once per purpose (the
//! working frame producers paint into, and the update engine's record of
//! what is physically on the sign) and mutated in place afterwards.
//!
//! ## Rust concepts
//! - `Vec<bool>` as an owned, contiguous 2D buffer
//! - Bounds-checked accessors returning `Result`/`Option` instead of panicking
//! - `impl Iterator` return types
//! - `fmt::Display` for human-readable dumps

use crate::SignConfig;
use crate::error::{Result, SignError};
use image::{GrayImage, ImageFormat, Luma};
use std::fmt;
use std::io::Cursor;

/// Physical state of a single dot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DotState {
    /// Bright side showing.
    Set,
    /// Dark side showing.
    Unset,
}

impl DotState {
    pub fn is_set(self) -> bool {
        matches!(self, DotState::Set)
    }
}

impl From<bool> for DotState {
    fn from(set: bool) -> Self {
        if set { DotState::Set } else { DotState::Unset }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    columns: usize,
    rows: usize,
    dots: Vec<bool>,
}

impl Frame {
    /// Create a frame with every dot unset.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            dots: vec![false; columns * rows],
        }
    }

    pub fn for_sign(config: SignConfig) -> Self {
        Self::new(config.columns, config.rows)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `(columns, rows)`, handy for dimension checks.
    pub fn size(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Unset every dot.
    pub fn clear(&mut self) {
        self.dots.fill(false);
    }

    /// Set every dot.
    pub fn fill(&mut self) {
        self.dots.fill(true);
    }

    pub fn set_dot(&mut self, col: usize, row: usize) -> Result<()> {
        self.write(col, row, true)
    }

    pub fn unset_dot(&mut self, col: usize, row: usize) -> Result<()> {
        self.write(col, row, false)
    }

    /// Set a dot given signed coordinates, ignoring anything off the grid.
    ///
    /// Renderers draw through this so that partially visible content (a
    /// message halfway off the left edge, a glyph hanging below the last
    /// row) needs no special casing.
    pub fn set_dot_clipped(&mut self, col: i32, row: i32) {
        if col < 0 || row < 0 {
            return;
        }
        let (col, row) = (col as usize, row as usize);
        if let Some(index) = self.index(col, row) {
            self.dots[index] = true;
        }
    }

    /// State of a dot, or `None` when out of range.
    pub fn get(&self, col: usize, row: usize) -> Option<bool> {
        self.index(col, row).map(|i| self.dots[i])
    }

    pub fn is_set(&self, col: usize, row: usize) -> bool {
        self.get(col, row).unwrap_or(false)
    }

    pub fn count_set(&self) -> usize {
        self.dots.iter().filter(|&&d| d).count()
    }

    /// Coordinates of every set dot, row by row, left to right.
    pub fn set_coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.dots
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(i, _)| (i % self.columns, i / self.columns))
    }

    /// Render the frame as a grayscale image, `scale` pixels per dot.
    pub fn to_image(&self, scale: u32) -> GrayImage {
        let scale = scale.max(1);
        let width = self.columns as u32 * scale;
        let height = self.rows as u32 * scale;
        GrayImage::from_fn(width, height, |x, y| {
            let set = self.is_set((x / scale) as usize, (y / scale) as usize);
            Luma([if set { 255 } else { 24 }])
        })
    }

    /// PNG-encoded preview of the frame.
    pub fn to_png(&self, scale: u32) -> std::result::Result<Vec<u8>, image::ImageError> {
        let mut bytes = Cursor::new(Vec::new());
        self.to_image(scale).write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    fn write(&mut self, col: usize, row: usize, value: bool) -> Result<()> {
        let index = self.index(col, row).ok_or(SignError::OutOfBounds {
            col,
            row,
            columns: self.columns,
            rows: self.rows,
        })?;
        self.dots[index] = value;
        Ok(())
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.columns && row < self.rows).then(|| row * self.columns + col)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.dots.chunks(self.columns.max(1)) {
            for &dot in row {
                f.write_str(if dot { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn new_frame_is_blank() {
        let frame = Frame::new(16, 9);
        assert_eq!(frame.size(), (16, 9));
        assert_eq!(frame.count_set(), 0);
    }

    #[test]
    fn clear_unsets_every_dot() {
        let mut frame = Frame::new(7, 5);
        frame.fill();
        assert_eq!(frame.count_set(), 35);

        frame.clear();
        for row in 0..5 {
            for col in 0..7 {
                assert_eq!(frame.get(col, row), Some(false));
            }
        }
    }

    #[test]
    fn set_and_unset_single_dot() {
        let mut frame = Frame::new(4, 4);
        frame.set_dot(2, 3).unwrap();
        assert!(frame.is_set(2, 3));
        assert_eq!(frame.count_set(), 1);

        frame.unset_dot(2, 3).unwrap();
        assert!(!frame.is_set(2, 3));
    }

    #[rstest]
    #[case(4, 0)]
    #[case(0, 3)]
    #[case(100, 100)]
    fn out_of_range_write_is_an_error(#[case] col: usize, #[case] row: usize) {
        let mut frame = Frame::new(4, 3);
        let err = frame.set_dot(col, row).unwrap_err();
        assert_eq!(
            err,
            SignError::OutOfBounds {
                col,
                row,
                columns: 4,
                rows: 3
            }
        );
        assert_eq!(frame.count_set(), 0);
        assert_eq!(frame.get(col, row), None);
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(0, -1)]
    #[case(4, 0)]
    #[case(0, 3)]
    fn clipped_write_ignores_off_grid(#[case] col: i32, #[case] row: i32) {
        let mut frame = Frame::new(4, 3);
        frame.set_dot_clipped(col, row);
        assert_eq!(frame.count_set(), 0);
    }

    #[test]
    fn set_coordinates_are_row_major() {
        let mut frame = Frame::new(3, 2);
        frame.set_dot(2, 0).unwrap();
        frame.set_dot(0, 1).unwrap();
        frame.set_dot(0, 0).unwrap();
        let coords: Vec<_> = frame.set_coordinates().collect();
        assert_eq!(coords, vec![(0, 0), (2, 0), (0, 1)]);
    }

    #[test]
    fn display_draws_rows() {
        let mut frame = Frame::new(3, 2);
        frame.set_dot(1, 0).unwrap();
        frame.set_dot(2, 1).unwrap();
        assert_eq!(frame.to_string(), ".#.\n..#\n");
    }

    #[test]
    fn image_preview_scales_dots() {
        let mut frame = Frame::new(2, 1);
        frame.set_dot(1, 0).unwrap();
        let img = frame.to_image(4);
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(img.get_pixel(5, 2)[0], 255);
        assert_eq!(img.get_pixel(1, 2)[0], 24);
    }

    #[test]
    fn png_preview_has_png_signature() {
        let frame = Frame::new(4, 4);
        let png = frame.to_png(2).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
