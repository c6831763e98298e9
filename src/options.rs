//! Contains [`DecodeOptions`], the knobs shared by every decode call.

/// Limits and unit conversions applied while decoding.
///
/// The defaults match what the presentation layer expects, so
/// most callers never construct this directly (see [`crate::decode`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Milliseconds per jiffy, used to convert ANI tick counts to delays.
    ///
    /// A jiffy is 1/60 s, rounded to a whole millisecond.
    pub jiffy_ms: u32,
    /// Inputs longer than this are rejected before parsing.
    pub max_input_len: usize,
    /// Frames wider or taller than this are rejected.
    pub max_dimension: u32,
    /// Side length of the square canvas used when a multi-image
    /// ICO/CUR has no exactly-fitting entry.
    pub fallback_size: u32,
    /// Animations whose frames add up to more pixels than this are
    /// rejected before any frame is assembled.
    pub max_total_pixels: usize,
}

impl DecodeOptions {
    /// Default value of [`Self::jiffy_ms`].
    pub const JIFFY_MS: u32 = 17;
    /// Default value of [`Self::max_input_len`] (16 MiB).
    pub const MAX_INPUT_LEN: usize = 16 * 1024 * 1024;
    /// Default value of [`Self::max_dimension`].
    pub const MAX_DIMENSION: u32 = 1024;
    /// Default value of [`Self::fallback_size`].
    pub const FALLBACK_SIZE: u32 = 32;
    /// Default value of [`Self::max_total_pixels`] (256 MiB of ARGB).
    pub const MAX_TOTAL_PIXELS: usize = 64 * 1024 * 1024;

    /// Returns `self` with [`Self::jiffy_ms`] replaced.
    #[must_use]
    pub const fn with_jiffy_ms(mut self, jiffy_ms: u32) -> Self {
        self.jiffy_ms = jiffy_ms;
        self
    }

    /// Returns `self` with [`Self::max_input_len`] replaced.
    #[must_use]
    pub const fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len;
        self
    }

    /// Returns `self` with [`Self::max_dimension`] replaced.
    #[must_use]
    pub const fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Returns `self` with [`Self::fallback_size`] replaced.
    #[must_use]
    pub const fn with_fallback_size(mut self, fallback_size: u32) -> Self {
        self.fallback_size = fallback_size;
        self
    }

    /// Returns `self` with [`Self::max_total_pixels`] replaced.
    #[must_use]
    pub const fn with_max_total_pixels(mut self, max_total_pixels: usize) -> Self {
        self.max_total_pixels = max_total_pixels;
        self
    }

    /// Converts `ticks` to milliseconds, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn ticks_to_ms(&self, ticks: u32) -> u32 {
        ticks.saturating_mul(self.jiffy_ms)
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            jiffy_ms: Self::JIFFY_MS,
            max_input_len: Self::MAX_INPUT_LEN,
            max_dimension: Self::MAX_DIMENSION,
            fallback_size: Self::FALLBACK_SIZE,
            max_total_pixels: Self::MAX_TOTAL_PIXELS,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builders_replace_one_field() {
        let options = DecodeOptions::default()
            .with_fallback_size(48)
            .with_max_total_pixels(10);

        assert_eq!(options.fallback_size, 48);
        assert_eq!(options.max_total_pixels, 10);
        assert_eq!(options.max_dimension, DecodeOptions::MAX_DIMENSION);
        assert_eq!(options.ticks_to_ms(3), 51);
        assert_eq!(options.ticks_to_ms(u32::MAX), u32::MAX);
    }
}
