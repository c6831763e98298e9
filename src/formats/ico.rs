//! Module for parsing [ICO/CUR](https://en.wikipedia.org/wiki/ICO_(file_format)) containers.
//!
//! Note: "CUR" and "ICO" share one layout, the only notable
//! difference is that cursors store a hotspot in each entry.
//!
//! ```text
//! typedef struct {
//!     WORD idReserved;  // Must be 0.
//!     WORD idType;      // 1 for icons, 2 for cursors.
//!     WORD idCount;     // Number of entries.
//! } ICONDIR;
//!
//! typedef struct {
//!     BYTE  bWidth;         // 0 means "ask the image" (usually 256).
//!     BYTE  bHeight;        // Ditto.
//!     BYTE  bColorCount;    // 0 for 8 bpp and up.
//!     BYTE  bReserved;
//!     WORD  wPlanes;        // Hotspot x for cursors.
//!     WORD  wBitCount;      // Hotspot y for cursors.
//!     DWORD dwBytesInRes;
//!     DWORD dwImageOffset;  // From the start of the file.
//! } ICONDIRENTRY;
//! ```

use super::{
    bytes::ByteCursor,
    dib::{self, DeclaredImage},
};
use crate::{
    cursors::raw_frame::RawFrame,
    error::{DecodeError, Result},
    options::DecodeOptions,
};

use binrw::binrw;

/// Length of one [`IconDirEntry`].
pub const ENTRY_LEN: usize = 16;

/// Whether a container (or one of its entries) is an icon or a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// No hotspot is stored; it's pinned to the top-left corner.
    Icon,
    /// Each entry stores a hotspot.
    Cursor,
}

impl ResourceType {
    /// Parses the `idType` field.
    ///
    /// ## Errors
    ///
    /// If `raw` isn't 1 or 2.
    pub fn from_raw(raw: u16) -> Result<Self> {
        match raw {
            1 => Ok(Self::Icon),
            2 => Ok(Self::Cursor),
            _ => Err(DecodeError::header(format!(
                "resource type must be 1 (icon) or 2 (cursor), instead got {raw}"
            ))),
        }
    }
}

/// Models an `ICONDIR`.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconDirHeader {
    /// Must be zero.
    pub reserved: u16,
    /// See [`ResourceType::from_raw`].
    pub resource_type: u16,
    /// Number of [`IconDirEntry`] records that follow.
    pub count: u16,
}

/// Models an `ICONDIRENTRY`.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IconDirEntry {
    /// Declared width, zero means "ask the image".
    pub width: u8,
    /// Declared height, zero means "ask the image".
    pub height: u8,
    /// Declared palette size, zero means "ask the image".
    pub color_count: u8,
    /// Not used.
    pub reserved: u8,
    /// Color planes for icons, hotspot x for cursors.
    pub planes_or_hotspot_x: u16,
    /// Bits per pixel for icons, hotspot y for cursors.
    pub bit_count_or_hotspot_y: u16,
    /// Length of the image in bytes.
    pub byte_len: u32,
    /// Offset of the image from the start of the container.
    pub offset: u32,
}

impl IconDirEntry {
    /// The hotspot in file orientation (y counted from the top).
    ///
    /// Only meaningful for [`ResourceType::Cursor`].
    #[inline]
    #[must_use]
    pub const fn hotspot(&self) -> (u16, u16) {
        (self.planes_or_hotspot_x, self.bit_count_or_hotspot_y)
    }

    /// What this entry says about its image, zero fields resolved to [`None`].
    #[must_use]
    pub fn declared(&self) -> DeclaredImage {
        let nonzero = |v: u8| (v != 0).then_some(u32::from(v));

        DeclaredImage {
            offset: self.offset as usize,
            byte_len: self.byte_len as usize,
            width: nonzero(self.width),
            height: nonzero(self.height),
            color_count: nonzero(self.color_count),
        }
    }
}

/// A parsed ICO/CUR directory.
///
/// Only the header and entries are parsed eagerly;
/// images are decoded by [`Self::decode_frames`].
#[derive(Debug, Clone)]
pub struct IconDir<'a> {
    resource_type: ResourceType,
    entries: Vec<IconDirEntry>,
    blob: &'a [u8],
}

impl<'a> IconDir<'a> {
    /// Parses the header and entry table of `blob`.
    ///
    /// Each entry's byte range is validated here, so
    /// later decoding never reads outside of `blob`.
    ///
    /// ## Errors
    ///
    /// - [`DecodeError::InvalidContainerHeader`] on bad reserved/type fields.
    /// - [`DecodeError::NoImages`] if there are no entries.
    /// - [`DecodeError::TruncatedInput`] if the table or an image range
    ///   extends past `blob`.
    pub fn parse(blob: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(blob);
        let header: IconDirHeader = cursor.read_struct()?;

        if header.reserved != 0 {
            return Err(DecodeError::header(format!(
                "reserved field must be 0, instead got {}",
                header.reserved
            )));
        }

        let resource_type = ResourceType::from_raw(header.resource_type)?;

        if header.count == 0 {
            return Err(DecodeError::NoImages("directory has no entries"));
        }

        let mut entries = Vec::with_capacity(usize::from(header.count));

        for _ in 0..header.count {
            let entry: IconDirEntry = cursor.read_struct()?;
            // reject now rather than halfway through decoding
            cursor.slice(entry.offset as usize, entry.byte_len as usize)?;
            entries.push(entry);
        }

        Ok(Self {
            resource_type,
            entries,
            blob,
        })
    }

    /// The container's resource type.
    #[inline]
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Entries in file order. Never empty.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// The first entry, which holds the file-level hotspot.
    #[inline]
    #[must_use]
    pub fn first_entry(&self) -> &IconDirEntry {
        // `parse` rejects empty tables
        &self.entries[0]
    }

    /// Decodes every entry, in entry order.
    ///
    /// ## Errors
    ///
    /// Any error from [`dib::decode_image`].
    pub fn decode_frames(&self, options: &DecodeOptions) -> Result<Vec<RawFrame>> {
        self.entries
            .iter()
            .map(|entry| {
                let declared = entry.declared();
                dib::decode_image(&self.blob[declared.offset..], &declared, options)
            })
            .collect()
    }

    /// Decodes the image used as the cursor, with its hotspot attached.
    ///
    /// The hotspot follows the container's own [`ResourceType`].
    ///
    /// ## Errors
    ///
    /// See [`Self::decode_as`].
    pub fn decode(&self, options: &DecodeOptions) -> Result<RawFrame> {
        self.decode_as(self.resource_type, options)
    }

    /// Decodes the image used as the cursor, computing the hotspot as if
    /// the container were `kind`.
    ///
    /// See [`select_frame`] for which image that is.
    ///
    /// ## Errors
    ///
    /// Any error from decoding the entries.
    pub fn decode_as(&self, kind: ResourceType, options: &DecodeOptions) -> Result<RawFrame> {
        if kind != self.resource_type {
            log::warn!(
                "treating {:?} container as {kind:?}, hotspot may be meaningless",
                self.resource_type
            );
        }

        let frame = select_frame(self.decode_frames(options)?, options.fallback_size)?;
        let (width, height) = frame.dimensions();

        let hotspot = match kind {
            ResourceType::Cursor => {
                let (x, y) = self.first_entry().hotspot();
                cursor_hotspot(x, y, width, height)
            }
            ResourceType::Icon => icon_hotspot(height),
        };

        Ok(frame.with_hotspot(Some(hotspot)))
    }
}

/// Picks the one image used out of a directory's decoded images.
///
/// - A lone image is used as-is, whatever its size.
/// - Otherwise, the first image that is exactly `size` x `size`.
/// - Otherwise, a `size` x `size` canvas populated from the first image
///   that matches `size` on either axis (or just the first image).
///
/// ## Errors
///
/// If `frames` is empty.
pub fn select_frame(mut frames: Vec<RawFrame>, size: u32) -> Result<RawFrame> {
    if frames.len() == 1 {
        return Ok(frames.swap_remove(0));
    }

    if let Some(idx) = frames.iter().position(|f| f.dimensions() == (size, size)) {
        return Ok(frames.swap_remove(idx));
    }

    let base = frames
        .iter()
        .find(|f| {
            let (w, h) = f.dimensions();
            w == size || h == size
        })
        .or_else(|| frames.first())
        .ok_or(DecodeError::NoImages("directory decoded to no images"))?;

    log::warn!(
        "no {size}x{size} image among {} images, coercing {:?} to {size}x{size}",
        frames.len(),
        base.dimensions()
    );

    base.coerced_to(size, size)
}

/// Hotspot of a cursor image, flipped to a bottom-left origin.
///
/// `y` is stored counted from the top, so it becomes `height - 1 - y`.
/// Out-of-range values are clamped into the image.
#[must_use]
pub fn cursor_hotspot(x: u16, y: u16, width: u32, height: u32) -> (u32, u32) {
    let (x, y) = (u32::from(x), u32::from(y));
    let max_x = width.saturating_sub(1);
    let max_y = height.saturating_sub(1);

    if x > max_x || y > max_y {
        log::warn!("hotspot=({x}, {y}) is outside of {width}x{height} image, clamping");
    }

    (x.min(max_x), max_y - y.min(max_y))
}

/// Hotspot of an icon image: the top-left corner, in a bottom-left origin.
#[inline]
#[must_use]
pub const fn icon_hotspot(height: u32) -> (u32, u32) {
    (0, height.saturating_sub(1))
}
