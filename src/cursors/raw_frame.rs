//! Contains [`RawFrame`], one decoded image before assembly.

use crate::error::{DecodeError, Result};

use std::fmt;

/// Alpha bits of a fully opaque ARGB pixel.
pub const OPAQUE: u32 = 0xff00_0000;

/// Packs channels into one `0xAARRGGBB` pixel.
#[inline]
#[must_use]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

/// Returns the alpha channel of an ARGB pixel.
#[inline]
#[must_use]
pub const fn alpha(pixel: u32) -> u8 {
    pixel.to_be_bytes()[0]
}

/// One decoded image.
///
/// Pixels are ARGB (`0xAARRGGBB`), row-major and **top-to-bottom**,
/// i.e, the first `width` pixels are the top row of the image.
///
/// The hotspot, when present, is already expressed the way the
/// final [`CursorArtifact`](super::artifact::CursorArtifact) expects it
/// (bottom-left origin).
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    hotspot: Option<(u32, u32)>,
}

impl RawFrame {
    /// Constructor for a [`RawFrame`] without a hotspot.
    ///
    /// ## Errors
    ///
    /// - If `width` or `height` is zero.
    /// - If `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidFrame(format!(
                "frame can't have zero-sized dimensions {width}x{height}"
            )));
        }

        let expected = pixel_count(width, height)?;

        if pixels.len() != expected {
            return Err(DecodeError::InvalidFrame(format!(
                "expected pixels.len()={expected}, instead got pixels.len()={}",
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
            hotspot: None,
        })
    }

    /// Returns `self` with its hotspot replaced.
    #[must_use]
    pub fn with_hotspot(mut self, hotspot: Option<(u32, u32)>) -> Self {
        self.hotspot = hotspot;
        self
    }

    /// Returns image dimensions as (width, height).
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the hotspot as (x, y), if any.
    #[inline]
    #[must_use]
    pub const fn hotspot(&self) -> Option<(u32, u32)> {
        self.hotspot
    }

    /// Returns the pixels, top row first.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns the pixel at (x, y), counted from the top-left.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }

        // in bounds, so these can't overflow `pixels.len()`
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterates over rows, top row first.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u32]> {
        self.pixels.chunks_exact(self.width as usize)
    }

    /// Returns a copy placed on a transparent `width` x `height` canvas.
    ///
    /// The image stays anchored to the top-left corner; whatever
    /// doesn't fit is cropped. The hotspot stays on the same pixel,
    /// so its (bottom-origin) y moves with the new height.
    ///
    /// ## Errors
    ///
    /// Same as [`Self::new`].
    pub fn coerced_to(&self, width: u32, height: u32) -> Result<Self> {
        if self.dimensions() == (width, height) {
            return Ok(self.clone());
        }

        let mut pixels = vec![0u32; pixel_count(width, height)?];
        let copy_w = self.width.min(width) as usize;

        for (dst, src) in pixels
            .chunks_exact_mut(width as usize)
            .zip(self.rows())
        {
            dst[..copy_w].copy_from_slice(&src[..copy_w]);
        }

        let hotspot = self
            .hotspot
            .map(|(x, y)| (x, y.saturating_add(height).saturating_sub(self.height)));

        Ok(Self::new(width, height, pixels)?.with_hotspot(hotspot))
    }
}

/// Computes `width * height` as a `usize`, guarding against overflow.
///
/// ## Errors
///
/// If the product doesn't fit.
pub(crate) fn pixel_count(width: u32, height: u32) -> Result<usize> {
    usize::try_from(u64::from(width) * u64::from(height)).map_err(|_| {
        DecodeError::InvalidFrame(format!("{width}x{height} frame can't be addressed"))
    })
}

// skip pixels when debugging
impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hotspot", &self.hotspot)
            .finish_non_exhaustive()
    }
}
