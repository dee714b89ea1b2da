use thiserror::Error;

/// Errors raised while building the inputs of a conversion.
///
/// Conversion itself cannot fail: a [`RawFrame`](crate::RawFrame) or
/// [`GlyphRamp`](crate::GlyphRamp) that exists has already been validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Frame has zero width or zero height.
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    /// Raw RGB buffer does not hold exactly `width * height * 3` bytes.
    #[error("expected {expected} bytes for a {width}x{height} RGB frame, got {actual}")]
    PixelCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Glyph ramp contains no characters.
    #[error("glyph ramp is empty")]
    EmptyRamp,

    /// Glyph ramp contains characters wider than one byte.
    #[error("glyph ramp contains non-ASCII characters: {0:?}")]
    NonAsciiRamp(String),
}
