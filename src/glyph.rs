use crate::error::ConvertError;

/// Reference ramp, sparsest to densest.
pub const DEFAULT_RAMP: &str = ".-:=+*%#@$";

/// Ordered set of glyphs used to represent increasing brightness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<u8>,
}

impl GlyphRamp {
    /// Build a ramp from a string of ASCII characters ordered darkest to brightest.
    pub fn new(chars: &str) -> Result<Self, ConvertError> {
        if chars.is_empty() {
            return Err(ConvertError::EmptyRamp);
        }
        if !chars.is_ascii() {
            return Err(ConvertError::NonAsciiRamp(chars.to_string()));
        }
        Ok(Self { glyphs: chars.as_bytes().to_vec() })
    }

    /// Number of glyphs in the ramp (`K`).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false: empty ramps are rejected by [`GlyphRamp::new`].
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Ramp index for a brightness in `[0, 255]`.
    ///
    /// `floor(brightness * K / 256)`, clamped to `K - 1`. Negative and NaN
    /// inputs land on index 0 because the float-to-int cast saturates.
    #[inline]
    pub fn index_for(&self, brightness: f64) -> usize {
        let k = self.glyphs.len();
        let idx = (brightness * k as f64 / 256.0).floor() as usize;
        idx.min(k - 1)
    }

    /// Glyph for a brightness in `[0, 255]`.
    #[inline]
    pub fn map(&self, brightness: f64) -> char {
        self.glyphs[self.index_for(brightness)] as char
    }

    /// Whether `c` is one of this ramp's glyphs.
    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.glyphs.contains(&(c as u8))
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII in `new`.
        std::str::from_utf8(&self.glyphs).unwrap_or_default()
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self { glyphs: DEFAULT_RAMP.as_bytes().to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_black_maps_to_first_glyph() {
        let ramp = GlyphRamp::default();
        assert_eq!(ramp.map(0.0), '.');
    }

    #[test]
    fn test_top_of_range_clamps_to_last_glyph() {
        let ramp = GlyphRamp::default();
        assert_eq!(ramp.index_for(255.0), 9);
        assert_eq!(ramp.map(255.0), '$');
        // Values at or past the top never index out of range.
        assert_eq!(ramp.index_for(256.0), 9);
        assert_eq!(ramp.index_for(1e9), 9);
    }

    #[test]
    fn test_bucket_boundaries() {
        let ramp = GlyphRamp::default();
        // K = 10, each bucket is 25.6 wide.
        assert_eq!(ramp.index_for(25.5), 0);
        assert_eq!(ramp.index_for(25.6), 1);
        assert_eq!(ramp.index_for(127.0), 4);
        assert_eq!(ramp.index_for(230.4), 9);
    }

    #[test]
    fn test_negative_and_nan_map_to_first_glyph() {
        let ramp = GlyphRamp::default();
        assert_eq!(ramp.index_for(-3.0), 0);
        assert_eq!(ramp.index_for(f64::NAN), 0);
    }

    #[test]
    fn test_single_glyph_ramp() {
        let ramp = GlyphRamp::new("#").unwrap();
        assert_eq!(ramp.map(0.0), '#');
        assert_eq!(ramp.map(255.0), '#');
    }

    #[test]
    fn test_rejects_bad_ramps() {
        assert_eq!(GlyphRamp::new(""), Err(ConvertError::EmptyRamp));
        assert!(matches!(GlyphRamp::new(".░▒"), Err(ConvertError::NonAsciiRamp(_))));
    }

    #[test]
    fn test_as_str_round_trips_input() {
        let ramp = GlyphRamp::new(" .:#").unwrap();
        assert_eq!(ramp.as_str(), " .:#");
        assert_eq!(GlyphRamp::default().as_str(), DEFAULT_RAMP);
    }

    proptest! {
        #[test]
        fn prop_map_returns_ramp_glyph(b in 0.0f64..=255.0) {
            let ramp = GlyphRamp::default();
            prop_assert!(ramp.contains(ramp.map(b)));
        }

        #[test]
        fn prop_map_is_monotonic(a in 0.0f64..=255.0, b in 0.0f64..=255.0) {
            let ramp = GlyphRamp::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ramp.index_for(lo) <= ramp.index_for(hi));
        }
    }
}
