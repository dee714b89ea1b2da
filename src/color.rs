//! True-color escape encoding of single pixels.

use crate::glyph::GlyphRamp;
use image::Rgb;
use std::fmt::Write;

/// Escape prefix selecting a 24-bit foreground color.
pub const FG_PREFIX: &str = "\x1b[38;2;";

/// Resets all terminal attributes. Emitted once per session, never per glyph.
pub const RESET: &str = "\x1b[0m";

/// Upper bound on the bytes one glyph-unit can take: `ESC[38;2;255;255;255m` plus the glyph.
pub const MAX_UNIT_LEN: usize = 20;

/// Unweighted mean of the three channels.
#[inline]
pub fn brightness(px: Rgb<u8>) -> f64 {
    (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0
}

/// Append `ESC[38;2;{r};{g};{b}m{glyph}` for one pixel.
#[inline]
pub fn encode_pixel_into(out: &mut String, px: Rgb<u8>, ramp: &GlyphRamp) {
    let [r, g, b] = px.0;
    // Writing to a String cannot fail.
    let _ = write!(out, "{FG_PREFIX}{r};{g};{b}m");
    out.push(ramp.map(brightness(px)));
}

/// Encode one pixel as a colored glyph-unit.
pub fn encode_pixel(px: Rgb<u8>, ramp: &GlyphRamp) -> String {
    let mut out = String::with_capacity(MAX_UNIT_LEN);
    encode_pixel_into(&mut out, px, ramp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_black_pixel_exact_bytes() {
        let ramp = GlyphRamp::default();
        assert_eq!(encode_pixel(Rgb([0, 0, 0]), &ramp), "\x1b[38;2;0;0;0m.");
    }

    #[test]
    fn test_white_pixel_uses_densest_glyph() {
        let ramp = GlyphRamp::default();
        assert_eq!(encode_pixel(Rgb([255, 255, 255]), &ramp), "\x1b[38;2;255;255;255m$");
    }

    #[test]
    fn test_brightness_is_real_mean() {
        // (1 + 1 + 2) / 3 = 1.33, truncation happens only in the ramp
        assert!((brightness(Rgb([1, 1, 2])) - 4.0 / 3.0).abs() < 1e-12);
        let ramp = GlyphRamp::default();
        // mean 25.67 crosses into bucket 1, integer division (25) would not
        assert_eq!(encode_pixel(Rgb([25, 26, 26]), &ramp), "\x1b[38;2;25;26;26m-");
    }

    #[test]
    fn test_no_reset_per_glyph() {
        let ramp = GlyphRamp::default();
        assert!(!encode_pixel(Rgb([10, 200, 30]), &ramp).contains(RESET));
    }

    #[test]
    fn test_unit_fits_capacity_hint() {
        let ramp = GlyphRamp::default();
        assert_eq!(encode_pixel(Rgb([255, 255, 255]), &ramp).len(), MAX_UNIT_LEN);
    }

    proptest! {
        #[test]
        fn prop_encoding_has_decimal_channels_then_one_glyph(r: u8, g: u8, b: u8) {
            let ramp = GlyphRamp::default();
            let unit = encode_pixel(Rgb([r, g, b]), &ramp);
            let needle = format!("38;2;{};{};{}m", r, g, b);
            prop_assert!(unit.starts_with('\x1b'));
            let at = unit.find(&needle).unwrap();
            let tail = &unit[at + needle.len()..];
            prop_assert_eq!(tail.chars().count(), 1);
            prop_assert!(ramp.contains(tail.chars().next().unwrap()));
        }
    }
}
