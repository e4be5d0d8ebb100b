//! Built-in bitmap fonts and the text renderer.
//!
//! Two fixed-width fonts are available, 3x5 and 4x5 dots. Each glyph is five
//! rows of bits, most significant (used) bit on the left. Characters without
//! a glyph render blank but still take up a cell, so message widths are
//! always `chars * pitch`.

use crate::frame::Frame;

/// Gap between adjacent glyphs, in columns.
pub const GLYPH_GAP: i32 = 1;

/// Height shared by both fonts.
pub const GLYPH_HEIGHT: usize = 5;

/// One glyph: a row of bits per dot row, leftmost dot in the highest used bit.
pub type GlyphRows = [u8; GLYPH_HEIGHT];

/// Which built-in font to draw with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FontSize {
    /// 3x5 dot cells. Used for the clock face.
    Small3x5,
    /// 4x5 dot cells. Used for scrolling messages.
    #[default]
    Medium4x5,
}

impl FontSize {
    pub fn width(self) -> usize {
        match self {
            FontSize::Small3x5 => 3,
            FontSize::Medium4x5 => 4,
        }
    }

    pub fn height(self) -> usize {
        GLYPH_HEIGHT
    }

    /// Column advance per character: glyph width plus the inter-glyph gap.
    pub fn pitch(self) -> i32 {
        self.width() as i32 + GLYPH_GAP
    }

    /// Bitmap for `ch`, or `None` if the font has no glyph for it.
    ///
    /// Lowercase ASCII letters share the uppercase glyphs.
    pub fn glyph(self, ch: char) -> Option<&'static GlyphRows> {
        let ch = ch.to_ascii_uppercase();
        let table = match self {
            FontSize::Small3x5 => FONT_3X5,
            FontSize::Medium4x5 => FONT_4X5,
        };
        table.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
    }
}

impl std::str::FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3x5" => Ok(FontSize::Small3x5),
            "4x5" => Ok(FontSize::Medium4x5),
            other => Err(format!("unknown font '{other}' (expected 3x5 or 4x5)")),
        }
    }
}

/// Width in columns that `text` occupies when rendered, gaps included.
pub fn text_width(text: &str, font: FontSize) -> i32 {
    text.chars().count() as i32 * font.pitch()
}

/// Stamp `text` into `frame` with its top-left corner at `(start_col, start_row)`.
///
/// Dots falling outside the frame are dropped, which is what lets a message
/// slide in and out of view one column at a time. The frame is not cleared
/// first; callers compose clears themselves.
pub fn render_text(frame: &mut Frame, start_col: i32, start_row: i32, text: &str, font: FontSize) {
    let width = font.width();
    let mut col = start_col;

    for ch in text.chars() {
        if let Some(rows) = font.glyph(ch) {
            for (dy, bits) in rows.iter().enumerate() {
                for dx in 0..width {
                    if bits & (1u8 << (width - 1 - dx)) != 0 {
                        frame.set_dot_clipped(col + dx as i32, start_row + dy as i32);
                    }
                }
            }
        }
        col += font.pitch();
    }
}

// ── Glyph tables ─────────────────────────────────────────────────────

const FONT_3X5: &[(char, GlyphRows)] = &[
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b011, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b110, 0b001, 0b010, 0b000, 0b010]),
];

const FONT_4X5: &[(char, GlyphRows)] = &[
    (' ', [0b0000, 0b0000, 0b0000, 0b0000, 0b0000]),
    ('0', [0b0110, 0b1001, 0b1001, 0b1001, 0b0110]),
    ('1', [0b0010, 0b0110, 0b0010, 0b0010, 0b0111]),
    ('2', [0b0110, 0b1001, 0b0010, 0b0100, 0b1111]),
    ('3', [0b1110, 0b0001, 0b0110, 0b0001, 0b1110]),
    ('4', [0b1001, 0b1001, 0b1111, 0b0001, 0b0001]),
    ('5', [0b1111, 0b1000, 0b1110, 0b0001, 0b1110]),
    ('6', [0b0110, 0b1000, 0b1110, 0b1001, 0b0110]),
    ('7', [0b1111, 0b0001, 0b0010, 0b0100, 0b0100]),
    ('8', [0b0110, 0b1001, 0b0110, 0b1001, 0b0110]),
    ('9', [0b0110, 0b1001, 0b0111, 0b0001, 0b0110]),
    ('A', [0b0110, 0b1001, 0b1111, 0b1001, 0b1001]),
    ('B', [0b1110, 0b1001, 0b1110, 0b1001, 0b1110]),
    ('C', [0b0111, 0b1000, 0b1000, 0b1000, 0b0111]),
    ('D', [0b1110, 0b1001, 0b1001, 0b1001, 0b1110]),
    ('E', [0b1111, 0b1000, 0b1110, 0b1000, 0b1111]),
    ('F', [0b1111, 0b1000, 0b1110, 0b1000, 0b1000]),
    ('G', [0b0111, 0b1000, 0b1011, 0b1001, 0b0111]),
    ('H', [0b1001, 0b1001, 0b1111, 0b1001, 0b1001]),
    ('I', [0b1110, 0b0100, 0b0100, 0b0100, 0b1110]),
    ('J', [0b0001, 0b0001, 0b0001, 0b1001, 0b0110]),
    ('K', [0b1001, 0b1010, 0b1100, 0b1010, 0b1001]),
    ('L', [0b1000, 0b1000, 0b1000, 0b1000, 0b1111]),
    ('M', [0b1001, 0b1111, 0b1111, 0b1001, 0b1001]),
    ('N', [0b1001, 0b1101, 0b1011, 0b1001, 0b1001]),
    ('O', [0b0110, 0b1001, 0b1001, 0b1001, 0b0110]),
    ('P', [0b1110, 0b1001, 0b1110, 0b1000, 0b1000]),
    ('Q', [0b0110, 0b1001, 0b1001, 0b1010, 0b0101]),
    ('R', [0b1110, 0b1001, 0b1110, 0b1010, 0b1001]),
    ('S', [0b0111, 0b1000, 0b0110, 0b0001, 0b1110]),
    ('T', [0b1110, 0b0100, 0b0100, 0b0100, 0b0100]),
    ('U', [0b1001, 0b1001, 0b1001, 0b1001, 0b0110]),
    ('V', [0b1001, 0b1001, 0b1010, 0b1010, 0b0100]),
    ('W', [0b1001, 0b1001, 0b1111, 0b1111, 0b1001]),
    ('X', [0b1001, 0b1001, 0b0110, 0b1001, 0b1001]),
    ('Y', [0b1010, 0b1010, 0b0100, 0b0100, 0b0100]),
    ('Z', [0b1111, 0b0001, 0b0110, 0b1000, 0b1111]),
    (':', [0b0000, 0b0100, 0b0000, 0b0100, 0b0000]),
    ('.', [0b0000, 0b0000, 0b0000, 0b0000, 0b0100]),
    ('-', [0b0000, 0b0000, 0b1111, 0b0000, 0b0000]),
    ('!', [0b0100, 0b0100, 0b0100, 0b0000, 0b0100]),
    ('?', [0b0110, 0b1001, 0b0010, 0b0000, 0b0010]),
];
