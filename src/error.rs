//! Contains [`DecodeError`], the single failure type of every decode call.
//!
//! Errors are raised where they're detected and abort the whole call.
//! There's no partial-result recovery: a bad frame inside an otherwise
//! valid ANI fails the entire cursor.

use std::io;

use thiserror::Error;

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Everything that can go wrong while decoding a cursor.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A read (or a computed offset) runs past the end of the buffer.
    #[error("read of {wanted} byte(s) at offset={offset} runs past the end of a {len}-byte buffer")]
    TruncatedInput {
        /// Where the read started.
        offset: usize,
        /// How many bytes were needed.
        wanted: usize,
        /// Length of the buffer being read.
        len: usize,
    },

    /// Wrong magic, reserved or resource-type fields.
    #[error("invalid container header: {0}")]
    InvalidContainerHeader(String),

    /// RIFX (big-endian) or a RIFF form other than "ACON".
    #[error("unsupported container form {0:?}")]
    UnsupportedContainerForm(String),

    /// Neither a BITMAPINFOHEADER nor a PNG signature at an image offset.
    #[error("unsupported image encoding at image offset={offset}, leading bytes={leading:02x?}")]
    UnsupportedImageEncoding {
        /// Image offset inside its container.
        offset: usize,
        /// Up to 8 leading bytes found there.
        leading: Vec<u8>,
    },

    /// Bit depth outside of 1/4/8/32 (or a color count outside of 2/16/256).
    #[error("unsupported color depth: {0}")]
    UnsupportedColorDepth(String),

    /// File extension isn't one of "ico", "cur" or "ani".
    #[error("unsupported extension {0:?}, expected one of \"ico\", \"cur\" or \"ani\"")]
    UnsupportedExtension(String),

    /// The container holds no usable image.
    #[error("no images found: {0}")]
    NoImages(&'static str),

    /// A "seq " entry points past the physical icons.
    #[error("sequence step={step} references icon={index}, but only {icons} icon(s) exist")]
    InvalidSequenceIndex {
        /// Position in the sequence.
        step: usize,
        /// Referenced icon index.
        index: u32,
        /// Number of physical icons.
        icons: usize,
    },

    /// A frame's pixel buffer doesn't match its dimensions.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Decoded dimensions exceed [`DecodeOptions::max_dimension`](crate::DecodeOptions).
    #[error("image of {width}x{height} exceeds the max dimension of {max}")]
    ImageTooLarge {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
        /// Configured limit.
        max: u32,
    },

    /// The assembled frames would exceed [`DecodeOptions::max_total_pixels`](crate::DecodeOptions).
    #[error("{frames} frame(s) of {width}x{height} exceed the max of {max} pixels")]
    OutputTooLarge {
        /// Number of frames that would be assembled.
        frames: usize,
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Configured limit.
        max: usize,
    },

    /// Input exceeds [`DecodeOptions::max_input_len`](crate::DecodeOptions).
    #[error("input of {len} bytes exceeds the max of {max} bytes")]
    InputTooLarge {
        /// Input length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// The PNG codec rejected an embedded PNG frame.
    #[error("failed to decode embedded PNG")]
    Png(#[from] image::ImageError),

    /// Reading a cursor file failed.
    #[error("failed to read cursor file")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Helper for [`Self::InvalidContainerHeader`].
    pub(crate) fn header(msg: impl Into<String>) -> Self {
        Self::InvalidContainerHeader(msg.into())
    }

    /// Helper for [`Self::UnsupportedColorDepth`].
    pub(crate) fn depth(msg: impl Into<String>) -> Self {
        Self::UnsupportedColorDepth(msg.into())
    }
}
