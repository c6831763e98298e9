//! Module for parsing [ANI](https://en.wikipedia.org/wiki/ANI_(file_format)).
//!
//! You may find it helpful to also read about [RIFF](https://en.wikipedia.org/wiki/Resource_Interchange_File_Format).
//!
//! ```text
//! RIFF('ACON'  // ANI files have the "ACON" identifier.
//!
//!     [LIST('INFO'
//!         [INAM(<ZSTR>)]  // Title.
//!         [IART(<ZSTR>)]  // Author.
//!     )]
//!
//!     'anih'(<ANIHEADER>)  // ANI file header.
//!
//!     ['rate'(<DWORD...>)]  // Per-step display time, in jiffies.
//!     ['seq '(<DWORD...>)]  // Per-step index into the frame list.
//!
//!     LIST('fram'
//!        'icon'(<icon_data_1>)  // Each is a complete ICO/CUR file.
//!        'icon'(<icon_data_2>)
//!        ...
//!     )
//! )
//! ```
//!
//! Chunks may appear in any order, but the walk ends at the frame list:
//! anything after it is ignored, as is any chunk this module doesn't know.

use super::{bytes::ByteCursor, ico::IconDir};
use crate::{
    cursors::timing::TimingPlan,
    error::{DecodeError, Result},
};

use std::{fmt, num::NonZeroU32};

use binrw::binrw;

/// Length of an `ANIHEADER`.
pub const ANI_HEADER_SIZE: u32 = 36;

/// Tag of a top-level chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// "anih", the [`AniHeader`].
    Header,
    /// "rate", per-step tick counts.
    Rate,
    /// "seq ", per-step icon indices.
    Sequence,
    /// "LIST", see [`ListKind`].
    List,
    /// Anything else. Ends the walk.
    Unknown([u8; 4]),
}

impl ChunkKind {
    /// Maps a tag to its kind.
    #[must_use]
    pub const fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"anih" => Self::Header,
            b"rate" => Self::Rate,
            b"seq " => Self::Sequence,
            b"LIST" => Self::List,
            _ => Self::Unknown(tag),
        }
    }
}

/// Type of a "LIST" chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// "INFO", title and author. Skipped.
    Info,
    /// "fram", the icons.
    Frames,
    /// Anything else. Ends the walk.
    Unknown([u8; 4]),
}

impl ListKind {
    /// Maps a tag to its kind.
    #[must_use]
    pub const fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"INFO" => Self::Info,
            b"fram" => Self::Frames,
            _ => Self::Unknown(tag),
        }
    }
}

/// Models an ANI file's header (or the "anih" chunk).
///
/// ```text
/// typedef struct {
///     DWORD cbSizeof;  // Should be sizeof(ANIHEADER) = 36 bytes.
///     DWORD cFrames;   // Number of frames in the frame list.
///     DWORD cSteps;    // Number of steps in the animation loop.
///
///     DWORD cx, cy;              // Declared size, 0 means "ask the icons".
///     DWORD cBitCount, cPlanes;  // Not used.
///
///     DWORD jifRate;  // Default display rate, in jiffies (1/60s).
///     DWORD fl;       // AF_ICON (0x1), AF_SEQUENCE (0x2).
/// } ANIHEADER;
/// ```
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AniHeader {
    /// Should be [`ANI_HEADER_SIZE`], but isn't checked.
    pub header_size: u32,
    /// Number of icons in the "fram" LIST.
    ///
    /// This is different from [`Self::num_steps`]:
    ///
    /// ```text
    /// sequence = [0, 1, 2, 1] => num_steps  = 4
    /// frames   = [0, 1, 2]    => num_frames = 3
    /// ```
    pub num_frames: u32,
    /// Number of steps in the animation loop.
    pub num_steps: u32,
    /// Declared width.
    pub width: u32,
    /// Declared height.
    pub height: u32,
    /// Not used.
    pub bit_count: u32,
    /// Not used.
    pub planes: u32,
    /// Default display time of each step, in jiffies.
    pub jiffy_rate: u32,
    /// `AF_ICON | AF_SEQUENCE`. Not used, the chunks present are what counts.
    pub flags: u32,
}

/// A walked ANI file.
///
/// Icons are kept as borrowed, still-encoded ICO/CUR blobs.
#[derive(Default)]
pub struct AniFile<'a> {
    /// The "anih" chunk, if one was found before the frame list.
    pub header: Option<AniHeader>,
    /// Display times, in jiffies. Usually [`None`].
    ///
    /// rate:   `[t_0, t_1, t_2, ...]`\
    /// steps:  `[f_0, f_1, f_2, ...]`
    ///
    /// Usually applied **after sequencing**, so each step `f_n` is
    /// displayed for `t_n` jiffies. Tables shorter than the sequence
    /// are read per icon instead, see [`TimingPlan::delays_ms`].
    pub rate: Option<Vec<u32>>,
    /// Icon indices giving the display order. Icons can repeat.
    ///
    /// icons:          `[f_0, f_1, f_2, f_3, ...]`\
    /// sequence:       `[2, 3, 0, 0, 1, ...]`\
    /// display order:  `[f_2, f_3, f_0, f_0, f_1, ...]`
    pub sequence: Option<Vec<u32>>,
    /// The physical icons, in file order.
    pub icons: Vec<&'a [u8]>,
}

// skip icons
impl fmt::Debug for AniFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AniFile")
            .field("header", &self.header)
            .field("rate", &self.rate)
            .field("sequence", &self.sequence)
            .field("icons", &self.icons.len())
            .finish_non_exhaustive()
    }
}

impl<'a> AniFile<'a> {
    /// Walks the chunks of `ani_blob`.
    ///
    /// The walk is bounded by the smaller of the RIFF length field and
    /// the blob itself, and ends (without error) at the end of the frame
    /// list, at an unknown tag, or when no complete chunk header is left.
    ///
    /// ## Errors
    ///
    /// - [`DecodeError::UnsupportedContainerForm`] for RIFX or a form type
    ///   other than "ACON".
    /// - [`DecodeError::InvalidContainerHeader`] for a missing RIFF magic.
    /// - [`DecodeError::NoImages`] if no icon was found.
    /// - [`DecodeError::TruncatedInput`] if a chunk runs past the bound.
    pub fn from_blob(ani_blob: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(ani_blob);

        match &cursor.read_tag()? {
            b"RIFF" => {}
            b"RIFX" => {
                return Err(DecodeError::UnsupportedContainerForm(
                    "RIFX (big-endian RIFF)".to_string(),
                ));
            }
            other => {
                return Err(DecodeError::header(format!(
                    "expected 'RIFF' magic, instead got {other:?}"
                )));
            }
        }

        let riff_len = cursor.read_u32_le()? as usize;
        let form = cursor.read_tag()?;

        if &form != b"ACON" {
            return Err(DecodeError::UnsupportedContainerForm(
                String::from_utf8_lossy(&form).into_owned(),
            ));
        }

        // the length field is unreliable, so it only ever shrinks the walk
        let end = riff_len.saturating_add(8).min(ani_blob.len());

        if end < ani_blob.len() {
            log::debug!(
                "ignoring {} byte(s) past riff_len={riff_len}",
                ani_blob.len() - end
            );
        }

        let mut cursor = ByteCursor::new(&ani_blob[..end]);
        cursor.seek(12)?;

        let mut ani = Self::default();

        // every iteration consumes at least 8 bytes, or breaks
        while cursor.remaining() >= 8 {
            let tag = cursor.read_tag()?;
            let len = cursor.read_u32_le()? as usize;

            log::debug!(
                "chunk {:?} at offset={}, len={len}",
                String::from_utf8_lossy(&tag),
                cursor.position() - 8
            );

            match ChunkKind::from_tag(tag) {
                ChunkKind::Header => {
                    let payload = cursor.read_exact(len)?;
                    let header: AniHeader = ByteCursor::new(payload).read_struct()?;

                    if header.header_size != ANI_HEADER_SIZE {
                        log::warn!(
                            "expected anih header_size={ANI_HEADER_SIZE}, instead got {}",
                            header.header_size
                        );
                    }

                    if ani.header.replace(header).is_some() {
                        log::warn!("duplicate 'anih' chunk, the last one wins");
                    }
                }

                ChunkKind::Rate => ani.rate = Some(read_u32s(cursor.read_exact(len)?)),
                ChunkKind::Sequence => ani.sequence = Some(read_u32s(cursor.read_exact(len)?)),

                ChunkKind::List => {
                    let list_len = len.checked_sub(4).ok_or_else(|| {
                        DecodeError::header(format!("LIST chunk of len={len} has no type"))
                    })?;

                    match ListKind::from_tag(cursor.read_tag()?) {
                        ListKind::Info => cursor.skip(list_len)?,
                        ListKind::Frames => {
                            ani.icons = ani.read_frame_list(&mut cursor, list_len)?;
                            break;
                        }
                        ListKind::Unknown(list_tag) => {
                            log::debug!("unknown LIST type {list_tag:?}, ending walk");
                            break;
                        }
                    }
                }

                ChunkKind::Unknown(tag) => {
                    log::debug!("unknown chunk {tag:?}, ending walk");
                    break;
                }
            }

            skip_padding(&mut cursor, len);
        }

        if cursor.remaining() > 0 {
            log::debug!("{} trailing byte(s) not walked", cursor.remaining());
        }

        if ani.icons.is_empty() {
            return Err(DecodeError::NoImages("ANI has no 'fram' list with icons"));
        }

        Ok(ani)
    }

    /// Reads the "icon" chunks of a "fram" LIST, positioned after its type.
    ///
    /// The number of icons comes from the header when it was seen,
    /// otherwise icons are read until the end of the list. A list that
    /// holds anything but that many "icon" chunks is rejected.
    ///
    /// Every icon is assumed to share the length of the first one.
    fn read_frame_list(
        &self,
        cursor: &mut ByteCursor<'a>,
        list_len: usize,
    ) -> Result<Vec<&'a [u8]>> {
        let list_end = cursor.position().saturating_add(list_len);
        let expected = self.header.map(|h| h.num_frames as usize);

        let mut icons = Vec::with_capacity(expected.unwrap_or_default().min(1024));
        let mut shared_len = None;

        while expected.is_none_or(|n| icons.len() < n)
            && cursor.position().saturating_add(8) <= list_end
        {
            let tag = cursor.read_tag()?;

            if &tag != b"icon" {
                return Err(DecodeError::header(format!(
                    "expected 'icon' chunk in 'fram' list, instead got {:?}",
                    String::from_utf8_lossy(&tag)
                )));
            }

            let len = cursor.read_u32_le()? as usize;
            let shared = *shared_len.get_or_insert(len);

            if len != shared {
                log::warn!(
                    "icon {} has len={len}, but the first icon's len={shared} is used",
                    icons.len()
                );
            }

            icons.push(cursor.read_exact(shared)?);
            skip_padding(cursor, shared);
        }

        if let Some(n) = expected
            && icons.len() != n
        {
            return Err(DecodeError::header(format!(
                "header declares {n} icon(s), but the 'fram' list holds {}",
                icons.len()
            )));
        }

        Ok(icons)
    }

    /// Builds the [`TimingPlan`], given the parsed icon directories.
    ///
    /// `icons` must be in file order; the first entry of each is used to
    /// recover declared dimensions when the header leaves them at zero.
    #[must_use]
    pub fn timing_plan(&self, icons: &[IconDir<'_>]) -> TimingPlan {
        let header = self.header.unwrap_or_default();
        let (mut width, mut height) = (header.width, header.height);

        for (i, dir) in icons.iter().enumerate() {
            // the second icon may fill in a missing height, only the first a width
            if width == 0 || (height == 0 && i == 1) {
                let entry = dir.first_entry();
                width = entry.width.into();
                height = entry.height.into();
            }
        }

        TimingPlan {
            rate: self.rate.clone(),
            sequence: self.sequence.clone(),
            jiffy: header.jiffy_rate,
            declared_width: NonZeroU32::new(width),
            declared_height: NonZeroU32::new(height),
            num_frames: header.num_frames,
            num_steps: header.num_steps,
        }
    }
}

/// Reads a chunk payload as little-endian u32s, ignoring any remainder.
fn read_u32s(payload: &[u8]) -> Vec<u32> {
    payload
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Chunks are word-aligned, so odd lengths are followed by a pad byte.
///
/// A missing pad byte at the very end is tolerated.
fn skip_padding(cursor: &mut ByteCursor<'_>, len: usize) {
    if len % 2 != 0 && cursor.remaining() > 0 {
        // can't fail, one byte remains
        let _ = cursor.skip(1);
    }
}
