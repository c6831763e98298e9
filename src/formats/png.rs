//! PNG frames embedded in ICO/CUR entries (Vista-style icons).
//!
//! Pixel decoding is delegated to [`image`]; this module only
//! detects the signature and repacks the codec's RGBA into ARGB.

use crate::{
    cursors::raw_frame::{RawFrame, argb},
    error::Result,
};

use image::ImageFormat;

/// The fixed 8-byte PNG signature.
pub const SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// Returns whether `blob` starts with the PNG signature.
#[inline]
#[must_use]
pub fn is_png(blob: &[u8]) -> bool {
    blob.starts_with(&SIGNATURE)
}

/// Decodes a PNG blob into a top-to-bottom ARGB frame.
///
/// The codec's own dimensions are adopted as-is.
///
/// ## Errors
///
/// If the codec rejects `blob`.
pub fn decode_png(blob: &[u8]) -> Result<RawFrame> {
    let rgba = image::load_from_memory_with_format(blob, ImageFormat::Png)?.into_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            argb(a, r, g, b)
        })
        .collect();

    RawFrame::new(width, height, pixels)
}
