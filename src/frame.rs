use crate::color::{encode_pixel_into, MAX_UNIT_LEN};
use crate::error::ConvertError;
use crate::glyph::GlyphRamp;
use image::{Rgb, RgbImage};
use std::fmt;

/// A decoded, already-resized grid of RGB pixels.
///
/// Always at least 1x1: frames with no pixels are rejected on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pixels: RgbImage,
}

impl RawFrame {
    /// Wrap a decoded image.
    pub fn from_image(pixels: RgbImage) -> Result<Self, ConvertError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ConvertError::EmptyFrame { width, height });
        }
        Ok(Self { pixels })
    }

    /// Build a frame from tightly packed row-major `R, G, B` bytes.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, ConvertError> {
        if width == 0 || height == 0 {
            return Err(ConvertError::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize * 3;
        let actual = bytes.len();
        let pixels = RgbImage::from_raw(width, height, bytes).filter(|_| actual == expected).ok_or(
            ConvertError::PixelCountMismatch { width, height, expected, actual },
        )?;
        Ok(Self { pixels })
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Result<Self, ConvertError>
    where
        F: FnMut(u32, u32) -> Rgb<u8>,
    {
        Self::from_image(RgbImage::from_fn(width, height, f))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.pixels
    }
}

/// One rendered frame: `height` newline-terminated lines of `width` colored glyph-units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsciiFrame {
    text: String,
    width: u32,
    height: u32,
}

impl AsciiFrame {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for AsciiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Converts pixel grids to colored ASCII using a fixed glyph ramp.
#[derive(Debug, Clone, Default)]
pub struct FrameConverter {
    ramp: GlyphRamp,
}

impl FrameConverter {
    pub fn new(ramp: GlyphRamp) -> Self {
        Self { ramp }
    }

    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    /// Convert a frame row by row, top to bottom, left to right.
    pub fn convert(&self, frame: &RawFrame) -> AsciiFrame {
        let (w, h) = (frame.width(), frame.height());
        let mut text = String::with_capacity((w as usize * MAX_UNIT_LEN + 1) * h as usize);
        for row in frame.pixels.rows() {
            for px in row {
                encode_pixel_into(&mut text, *px, &self.ramp);
            }
            text.push('\n');
        }
        AsciiFrame { text, width: w, height: h }
    }
}

/// Convert a frame with the reference ramp.
pub fn convert(frame: &RawFrame) -> AsciiFrame {
    FrameConverter::default().convert(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn units_per_line(frame: &AsciiFrame) -> Vec<usize> {
        frame.as_str().lines().map(|l| l.matches('\x1b').count()).collect()
    }

    #[test]
    fn test_black_2x2_frame() {
        let frame = RawFrame::from_fn(2, 2, |_, _| Rgb([0, 0, 0])).unwrap();
        let unit = "\x1b[38;2;0;0;0m.";
        let expected = format!("{unit}{unit}\n{unit}{unit}\n");
        assert_eq!(convert(&frame).as_str(), expected);
    }

    #[test]
    fn test_row_major_order() {
        let frame = RawFrame::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }).unwrap();
        assert_eq!(convert(&frame).as_str(), "\x1b[38;2;0;0;0m.\x1b[38;2;255;255;255m$\n");
    }

    #[test]
    fn test_custom_ramp() {
        let conv = FrameConverter::new(GlyphRamp::new(" #").unwrap());
        let frame = RawFrame::from_fn(1, 2, |_, y| Rgb([y as u8 * 200, y as u8 * 200, y as u8 * 200])).unwrap();
        assert_eq!(conv.convert(&frame).as_str(), "\x1b[38;2;0;0;0m \n\x1b[38;2;200;200;200m#\n");
    }

    #[test]
    fn test_rejects_empty_frames() {
        assert_eq!(
            RawFrame::from_raw(0, 4, Vec::new()),
            Err(ConvertError::EmptyFrame { width: 0, height: 4 })
        );
        assert_eq!(
            RawFrame::from_image(RgbImage::new(3, 0)),
            Err(ConvertError::EmptyFrame { width: 3, height: 0 })
        );
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        assert_eq!(
            RawFrame::from_raw(2, 2, vec![0; 11]),
            Err(ConvertError::PixelCountMismatch { width: 2, height: 2, expected: 12, actual: 11 })
        );
        assert!(RawFrame::from_raw(2, 2, vec![0; 13]).is_err());
        assert!(RawFrame::from_raw(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_from_raw_pixel_layout() {
        let frame = RawFrame::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.pixel(0, 0), Rgb([1, 2, 3]));
        assert_eq!(frame.pixel(1, 0), Rgb([4, 5, 6]));
    }

    proptest! {
        #[test]
        fn prop_output_shape_matches_frame(w in 1u32..24, h in 1u32..24, seed: u8) {
            let frame = RawFrame::from_fn(w, h, |x, y| {
                Rgb([seed.wrapping_add(x as u8), (y as u8).wrapping_mul(7), seed ^ (x as u8)])
            }).unwrap();
            let out = convert(&frame);
            prop_assert_eq!(out.height(), h);
            prop_assert_eq!(out.width(), w);
            prop_assert!(out.as_str().ends_with('\n'));
            let counts = units_per_line(&out);
            prop_assert_eq!(counts.len(), h as usize);
            prop_assert!(counts.iter().all(|&c| c == w as usize));
        }
    }
}
