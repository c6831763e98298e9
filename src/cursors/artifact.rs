//! Contains [`CursorArtifact`], the decoded cursor handed to callers.

use super::raw_frame::pixel_count;
use crate::error::{DecodeError, Result};

use std::fmt;

/// A decoded cursor: fixed-size ARGB frames, per-frame delays and a hotspot.
///
/// Pixels are `0xAARRGGBB`, and **rows are stored bottom-to-top**
/// (row 0 is the bottom of the image). The hotspot shares that
/// bottom-left origin. Frames are stored back-to-back.
///
/// Invariants, upheld by [`Self::new`]:
///
/// - `pixels.len() == frame_count * width * height`
/// - `delays` is [`Some`] iff `frame_count > 1`, with `frame_count` entries
/// - `hotspot_x < width` and `hotspot_y < height`
#[derive(Clone, PartialEq, Eq)]
pub struct CursorArtifact {
    width: u32,
    height: u32,
    hotspot_x: u32,
    hotspot_y: u32,
    frame_count: u32,
    pixels: Vec<u32>,
    delays: Option<Vec<u32>>,
}

impl CursorArtifact {
    /// Validating constructor.
    ///
    /// ## Errors
    ///
    /// [`DecodeError::InvalidFrame`] if any invariant doesn't hold.
    pub fn new(
        (width, height): (u32, u32),
        (hotspot_x, hotspot_y): (u32, u32),
        frame_count: u32,
        pixels: Vec<u32>,
        delays: Option<Vec<u32>>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || frame_count == 0 {
            return Err(DecodeError::InvalidFrame(format!(
                "artifact can't be empty: {width}x{height}, frame_count={frame_count}"
            )));
        }

        if hotspot_x >= width || hotspot_y >= height {
            return Err(DecodeError::InvalidFrame(format!(
                "hotspot=({hotspot_x}, {hotspot_y}) outside of {width}x{height}"
            )));
        }

        let expected = pixel_count(width, height)?
            .checked_mul(frame_count as usize)
            .ok_or_else(|| DecodeError::InvalidFrame("pixel count overflows".to_string()))?;

        if pixels.len() != expected {
            return Err(DecodeError::InvalidFrame(format!(
                "expected pixels.len()={expected}, instead got pixels.len()={}",
                pixels.len()
            )));
        }

        match &delays {
            None if frame_count > 1 => {
                return Err(DecodeError::InvalidFrame(format!(
                    "{frame_count} frames need delays"
                )));
            }
            Some(_) if frame_count == 1 => {
                return Err(DecodeError::InvalidFrame(
                    "a static cursor can't have delays".to_string(),
                ));
            }
            Some(d) if d.len() != frame_count as usize => {
                return Err(DecodeError::InvalidFrame(format!(
                    "expected {frame_count} delays, instead got {}",
                    d.len()
                )));
            }
            _ => {}
        }

        Ok(Self {
            width,
            height,
            hotspot_x,
            hotspot_y,
            frame_count,
            pixels,
            delays,
        })
    }

    /// Returns (width, height), shared by every frame.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the hotspot as (x, y), from the bottom-left corner.
    #[inline]
    #[must_use]
    pub const fn hotspot(&self) -> (u32, u32) {
        (self.hotspot_x, self.hotspot_y)
    }

    /// Number of frames. 1 for static cursors.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Whether there's more than one frame.
    #[inline]
    #[must_use]
    pub const fn is_animated(&self) -> bool {
        self.frame_count > 1
    }

    /// Every frame's pixels, back-to-back.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// [`Self::pixels`] as native-endian bytes, for uploading as-is.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Per-frame delays in milliseconds, [`None`] for static cursors.
    #[inline]
    #[must_use]
    pub fn delays(&self) -> Option<&[u32]> {
        self.delays.as_deref()
    }

    /// Delay of frame `i` in milliseconds. Always 0 for static cursors.
    #[must_use]
    pub fn delay(&self, i: usize) -> Option<u32> {
        match &self.delays {
            Some(delays) => delays.get(i).copied(),
            None => (i == 0).then_some(0),
        }
    }

    /// Length of one loop of the animation in milliseconds.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.delays
            .iter()
            .flatten()
            .map(|d| u64::from(*d))
            .sum()
    }

    /// Pixels of frame `i`, bottom row first.
    #[must_use]
    pub fn frame(&self, i: usize) -> Option<&[u32]> {
        let len = self.width as usize * self.height as usize;
        self.pixels.chunks_exact(len).nth(i)
    }

    /// Row `y` (counted from the bottom) of frame `i`.
    #[must_use]
    pub fn row(&self, i: usize, y: u32) -> Option<&[u32]> {
        self.frame(i)?
            .chunks_exact(self.width as usize)
            .nth(y as usize)
    }

    /// Frame `i` as RGBA bytes, top row first.
    ///
    /// This is the layout most image libraries expect.
    #[must_use]
    pub fn to_rgba_top_down(&self, i: usize) -> Option<Vec<u8>> {
        let frame = self.frame(i)?;

        Some(
            frame
                .chunks_exact(self.width as usize)
                .rev()
                .flatten()
                .flat_map(|px| {
                    let [a, r, g, b] = px.to_be_bytes();
                    [r, g, b, a]
                })
                .collect(),
        )
    }
}

// skip pixels when debugging
impl fmt::Debug for CursorArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorArtifact")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hotspot_x", &self.hotspot_x)
            .field("hotspot_y", &self.hotspot_y)
            .field("frame_count", &self.frame_count)
            .field("delays", &self.delays)
            .finish_non_exhaustive()
    }
}
