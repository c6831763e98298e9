//! Decoder for the images stored behind ICO/CUR directory entries.
//!
//! Each entry points to either:
//!
//! 1) A device-independent bitmap: a 40-byte `BITMAPINFOHEADER`, an
//!    optional palette, the color (XOR) plane and a 1-bit transparency
//!    (AND) plane. Both planes are stored bottom-up, with every row padded
//!    to a multiple of four bytes.
//! 2) A complete PNG file, handed to [`super::png`].
//!
//! ```text
//! typedef struct {
//!     DWORD biSize;          // Always 40 here, doubles as a signature.
//!     LONG  biWidth;
//!     LONG  biHeight;        // XOR + AND rows, so twice the image height.
//!     WORD  biPlanes;
//!     WORD  biBitCount;      // 1, 4, 8 or 32 are supported.
//!     DWORD biCompression;   // Not used.
//!     DWORD biSizeImage;     // Not used.
//!     LONG  biXPelsPerMeter; // Not used.
//!     LONG  biYPelsPerMeter; // Not used.
//!     DWORD biClrUsed;       // Not used, palettes are always full.
//!     DWORD biClrImportant;  // Not used.
//! } BITMAPINFOHEADER;
//! ```
//!
//! ## References
//!
//! - [Wikipedia: ICO structure](https://en.wikipedia.org/wiki/ICO_(file_format)#Icon_resource_structure)
//! - [Wikipedia: BMP DIB header](https://en.wikipedia.org/wiki/BMP_file_format#DIB_header_(bitmap_information_header))

use super::{bytes::ByteCursor, png};
use crate::{
    cursors::raw_frame::{OPAQUE, RawFrame, argb, pixel_count},
    error::{DecodeError, Result},
    options::DecodeOptions,
};

use binrw::binrw;

/// The `biSize` value that identifies a `BITMAPINFOHEADER`.
pub const DIB_HEADER_SIZE: u32 = 40;

/// Models a `BITMAPINFOHEADER`.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    /// Size of this header, always [`DIB_HEADER_SIZE`].
    pub size: u32,
    /// Image width.
    pub width: u32,
    /// Height of XOR and AND planes combined.
    pub height: u32,
    /// Color planes. Should be 1.
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,

    // compression, image size, resolution and palette counts
    // are all ignored, but kept so that the record is complete
    pub(crate) compression: u32,
    pub(crate) size_image: u32,
    pub(crate) x_pels_per_meter: u32,
    pub(crate) y_pels_per_meter: u32,
    pub(crate) clr_used: u32,
    pub(crate) clr_important: u32,
}

/// How the pixels of one entry are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Bitmap with a `BITMAPINFOHEADER`.
    Dib,
    /// Embedded PNG file.
    Png,
}

impl ImageEncoding {
    /// Detects the encoding from the leading bytes of `blob`.
    #[must_use]
    pub fn detect(blob: &[u8]) -> Option<Self> {
        if blob.starts_with(&DIB_HEADER_SIZE.to_le_bytes()) {
            Some(Self::Dib)
        } else if png::is_png(blob) {
            Some(Self::Png)
        } else {
            None
        }
    }
}

/// Palette-based bitmap depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedDepth {
    /// 1 bpp, 2-entry palette.
    Mono,
    /// 4 bpp, 16-entry palette.
    Nibble,
    /// 8 bpp, 256-entry palette.
    Byte,
}

impl IndexedDepth {
    /// Bits per pixel of the color plane.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Nibble => 4,
            Self::Byte => 8,
        }
    }

    /// Number of palette entries stored after the header.
    #[must_use]
    pub const fn palette_len(self) -> usize {
        match self {
            Self::Mono => 2,
            Self::Nibble => 16,
            Self::Byte => 256,
        }
    }

    /// Palette index of pixel `col` in a color-plane row.
    ///
    /// `row` must be a full row of the plane.
    #[inline]
    fn index(self, row: &[u8], col: usize) -> usize {
        match self {
            Self::Mono => usize::from((row[col / 8] >> (7 - col % 8)) & 1),
            // high nibble first
            Self::Nibble if col % 2 == 0 => usize::from(row[col / 2] >> 4),
            Self::Nibble => usize::from(row[col / 2] & 0x0f),
            Self::Byte => usize::from(row[col]),
        }
    }
}

/// Supported bitmap color depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    /// 1/4/8 bpp with a palette.
    Indexed(IndexedDepth),
    /// 32 bpp BGRA, no palette.
    TrueColor,
}

impl ColorDepth {
    /// Depth implied by a directory entry's (non-zero) color count.
    ///
    /// ## Errors
    ///
    /// If `count` isn't 2, 16 or 256.
    pub fn from_color_count(count: u32) -> Result<Self> {
        let indexed = match count {
            2 => IndexedDepth::Mono,
            16 => IndexedDepth::Nibble,
            256 => IndexedDepth::Byte,
            _ => {
                return Err(DecodeError::depth(format!(
                    "directory declares color_count={count}"
                )));
            }
        };

        Ok(Self::Indexed(indexed))
    }

    /// Depth implied by the bitmap header's planes and bit count.
    ///
    /// ## Errors
    ///
    /// If the effective bit count isn't 1, 4, 8 or 32.
    pub fn from_header(planes: u16, bit_count: u16) -> Result<Self> {
        let bits = if planes == 1 {
            u32::from(bit_count)
        } else {
            u32::from(bit_count) * u32::from(planes)
        };

        match bits {
            1 => Ok(Self::Indexed(IndexedDepth::Mono)),
            4 => Ok(Self::Indexed(IndexedDepth::Nibble)),
            8 => Ok(Self::Indexed(IndexedDepth::Byte)),
            32 => Ok(Self::TrueColor),
            _ => Err(DecodeError::depth(format!(
                "planes={planes}, bit_count={bit_count}"
            ))),
        }
    }

    /// Bits per pixel of the color plane.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Indexed(indexed) => indexed.bits(),
            Self::TrueColor => 32,
        }
    }
}

/// What a directory entry says about its image.
///
/// Zero fields in the entry mean "ask the image itself"
/// and are stored here as [`None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredImage {
    /// Offset of the image inside its container, for error reporting.
    pub offset: usize,
    /// Declared byte length of the image.
    pub byte_len: usize,
    /// Declared width.
    pub width: Option<u32>,
    /// Declared height (of the image, not the stacked planes).
    pub height: Option<u32>,
    /// Declared palette size.
    pub color_count: Option<u32>,
}

/// Bytes per row of a plane with `bits` bits per pixel,
/// rounded up to a double-word boundary.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn bytes_per_row(width: u32, bits: u32) -> usize {
    // u64 so that no (width, bits) pair overflows
    (((width as u64 * bits as u64 + 31) / 32) * 4) as usize
}

/// Decodes the image that starts at `blob[0]`.
///
/// `blob` runs from the image's offset to the end of its
/// container; the PNG path only uses [`DeclaredImage::byte_len`] bytes.
///
/// ## Errors
///
/// - [`DecodeError::UnsupportedImageEncoding`] if neither signature matches.
/// - [`DecodeError::UnsupportedColorDepth`] for depths other than 1/4/8/32.
/// - [`DecodeError::TruncatedInput`] if the planes don't fit in `blob`.
/// - [`DecodeError::ImageTooLarge`] if the image exceeds `options`.
pub fn decode_image(
    blob: &[u8],
    declared: &DeclaredImage,
    options: &DecodeOptions,
) -> Result<RawFrame> {
    let frame = match ImageEncoding::detect(blob) {
        Some(ImageEncoding::Dib) => decode_dib(blob, declared, options)?,
        Some(ImageEncoding::Png) => {
            let png_blob = ByteCursor::new(blob).slice(0, declared.byte_len)?;
            png::decode_png(png_blob)?
        }
        None => {
            return Err(DecodeError::UnsupportedImageEncoding {
                offset: declared.offset,
                leading: blob.iter().take(8).copied().collect(),
            });
        }
    };

    let (width, height) = frame.dimensions();
    check_dimensions(width, height, options)?;

    Ok(frame)
}

/// Rejects empty images and images larger than the configured max dimension.
fn check_dimensions(width: u32, height: u32, options: &DecodeOptions) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFrame(format!(
            "image of {width}x{height} has no pixels"
        )));
    }

    if width > options.max_dimension || height > options.max_dimension {
        return Err(DecodeError::ImageTooLarge {
            width,
            height,
            max: options.max_dimension,
        });
    }

    Ok(())
}

/// DIB half of [`decode_image`].
fn decode_dib(blob: &[u8], declared: &DeclaredImage, options: &DecodeOptions) -> Result<RawFrame> {
    let mut cursor = ByteCursor::new(blob);
    let header: BitmapInfoHeader = cursor.read_struct()?;

    let width = declared.width.unwrap_or(header.width);
    // height in the header covers both planes
    let height = declared.height.unwrap_or(header.height / 2);
    check_dimensions(width, height, options)?;

    let depth = match declared.color_count {
        Some(count) => ColorDepth::from_color_count(count)?,
        None => ColorDepth::from_header(header.planes, header.bit_count)?,
    };

    let xor_stride = bytes_per_row(width, depth.bits());
    let and_stride = bytes_per_row(width, 1);
    let rows = height as usize;
    let cols = width as usize;
    let mut pixels = vec![0u32; pixel_count(width, height)?];

    log::debug!(
        "decoding {width}x{height} DIB at offset={}, depth={depth:?}",
        declared.offset
    );

    match depth {
        ColorDepth::TrueColor => {
            let xor = cursor.read_exact(xor_stride * rows)?;

            // all-zero alpha means the format predates alpha channels,
            // and transparency lives in the AND mask (if there is one)
            let has_alpha = xor
                .chunks_exact(xor_stride)
                .any(|row| row[..cols * 4].chunks_exact(4).any(|px| px[3] != 0));

            let mask = if has_alpha {
                None
            } else {
                cursor.read_exact(and_stride * rows).ok()
            };

            for (y, row) in xor.chunks_exact(xor_stride).enumerate() {
                // bottom-up, so the first stored row is the last one
                let dst = &mut pixels[(rows - 1 - y) * cols..][..cols];

                for (x, px) in row.chunks_exact(4).take(cols).enumerate() {
                    let [b, g, r, a] = [px[0], px[1], px[2], px[3]];

                    dst[x] = if has_alpha {
                        argb(a, r, g, b)
                    } else {
                        let rgb = argb(0, r, g, b);
                        match mask {
                            Some(mask) if is_masked(&mask[y * and_stride..], x) => rgb,
                            _ => rgb | OPAQUE,
                        }
                    };
                }
            }
        }
        ColorDepth::Indexed(indexed) => {
            let palette = read_palette(&mut cursor, indexed.palette_len())?;
            let xor = cursor.read_exact(xor_stride * rows)?;
            let mask = cursor.read_exact(and_stride * rows)?;

            for (y, (row, mask_row)) in xor
                .chunks_exact(xor_stride)
                .zip(mask.chunks_exact(and_stride))
                .enumerate()
            {
                let dst = &mut pixels[(rows - 1 - y) * cols..][..cols];

                for (x, px) in dst.iter_mut().enumerate() {
                    let rgb = palette[indexed.index(row, x)];

                    // a set AND bit means transparent, otherwise
                    // it's fully opaque whatever the palette says
                    *px = if is_masked(mask_row, x) {
                        rgb
                    } else {
                        rgb | OPAQUE
                    };
                }
            }
        }
    }

    RawFrame::new(width, height, pixels)
}

/// Reads `len` palette entries (B, G, R, reserved) as alpha-less ARGB.
fn read_palette(cursor: &mut ByteCursor<'_>, len: usize) -> Result<Vec<u32>> {
    let raw = cursor.read_exact(len * 4)?;

    Ok(raw
        .chunks_exact(4)
        .map(|quad| argb(0, quad[2], quad[1], quad[0]))
        .collect())
}

/// Whether pixel `x` of an AND-mask row is transparent.
#[inline]
fn is_masked(mask_row: &[u8], x: usize) -> bool {
    mask_row[x / 8] & (0x80 >> (x % 8)) != 0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cursors::raw_frame::alpha,
        testing::{self, DibSpec},
    };

    fn declared_for(blob: &[u8]) -> DeclaredImage {
        DeclaredImage {
            byte_len: blob.len(),
            ..DeclaredImage::default()
        }
    }

    #[test]
    fn scanline_math_is_dword_aligned() {
        for width in 1..=300 {
            for bits in [1, 4, 8, 24, 32] {
                let bytes = bytes_per_row(width, bits);
                let min_bytes = (width * bits).div_ceil(8) as usize;

                assert_eq!(bytes % 4, 0, "width={width}, bits={bits}");
                assert!(bytes >= min_bytes, "width={width}, bits={bits}");
                assert!(bytes < min_bytes + 4, "width={width}, bits={bits}");
            }
        }

        assert_eq!(bytes_per_row(32, 1), 4);
        assert_eq!(bytes_per_row(3, 4), 4);
        assert_eq!(bytes_per_row(5, 8), 8);
    }

    #[test]
    fn color_depth_resolution() {
        use IndexedDepth::{Byte, Mono, Nibble};

        assert_eq!(ColorDepth::from_header(1, 1).unwrap(), ColorDepth::Indexed(Mono));
        assert_eq!(ColorDepth::from_header(1, 4).unwrap(), ColorDepth::Indexed(Nibble));
        assert_eq!(ColorDepth::from_header(1, 8).unwrap(), ColorDepth::Indexed(Byte));
        assert_eq!(ColorDepth::from_header(1, 32).unwrap(), ColorDepth::TrueColor);
        assert_eq!(ColorDepth::from_header(4, 1).unwrap(), ColorDepth::Indexed(Nibble));

        assert!(matches!(
            ColorDepth::from_header(1, 24),
            Err(DecodeError::UnsupportedColorDepth(_))
        ));
        assert!(ColorDepth::from_color_count(8).is_err());
        assert_eq!(ColorDepth::from_color_count(16).unwrap(), ColorDepth::Indexed(Nibble));
    }

    #[test]
    fn mono_flips_rows_and_uses_palette() {
        // top row black/white, bottom row white/black
        let blob = DibSpec::indexed(2, 2, 1, vec![[0, 0, 0], [255, 255, 255]])
            .pixels(vec![0, 1, 1, 0])
            .build();

        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();

        assert_eq!(frame.dimensions(), (2, 2));
        assert_eq!(
            frame.pixels(),
            &[0xff00_0000, 0xffff_ffff, 0xffff_ffff, 0xff00_0000]
        );
    }

    #[test]
    fn and_mask_overrides_palette_alpha() {
        let mut spec = DibSpec::indexed(4, 1, 4, testing::ramp_palette(16))
            .pixels(vec![1, 2, 3, 15])
            .mask(vec![true, false, true, false]);
        // palette "alpha" bytes are garbage, they must be ignored
        spec.palette_reserved = 0x7f;
        let blob = spec.build();

        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();
        let alphas: Vec<u8> = frame.pixels().iter().map(|p| alpha(*p)).collect();

        assert_eq!(alphas, [0, 255, 0, 255]);
        // transparent pixels still carry their palette color
        assert_eq!(frame.pixels()[0] & 0x00ff_ffff, 0x0001_0101);
        assert_eq!(frame.pixels()[3] & 0x00ff_ffff, 0x000f_0f0f);
    }

    #[test]
    fn nibbles_are_high_first() {
        let blob = DibSpec::indexed(3, 1, 4, testing::ramp_palette(16))
            .pixels(vec![0xa, 0x5, 0xc])
            .build();

        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();

        assert_eq!(frame.pixels(), &[0xff0a_0a0a, 0xff05_0505, 0xff0c_0c0c]);
    }

    #[test]
    fn byte_indices_with_row_padding() {
        // width 5 => 8-byte rows, padding must be skipped
        let blob = DibSpec::indexed(5, 2, 8, testing::ramp_palette(256))
            .pixels(vec![10, 20, 30, 40, 50, 200, 201, 202, 203, 204])
            .build();

        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();

        assert_eq!(frame.pixel(0, 0), Some(0xff0a_0a0a));
        assert_eq!(frame.pixel(4, 0), Some(0xff32_3232));
        assert_eq!(frame.pixel(0, 1), Some(0xffc8_c8c8));
        assert_eq!(frame.pixel(4, 1), Some(0xffcc_cccc));
    }

    #[test]
    fn true_color_keeps_alpha() {
        let blob = DibSpec::true_color(2, 1)
            .pixels(vec![0x8011_2233, 0x0044_5566])
            .build();

        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();

        assert_eq!(frame.pixels(), &[0x8011_2233, 0x0044_5566]);
    }

    #[test]
    fn true_color_without_alpha_falls_back_to_mask_or_opaque() {
        let with_mask = DibSpec::true_color(2, 1)
            .pixels(vec![0x0011_2233, 0x0044_5566])
            .mask(vec![true, false])
            .build();

        let frame = decode_image(
            &with_mask,
            &declared_for(&with_mask),
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(frame.pixels(), &[0x0011_2233, 0xff44_5566]);

        let without_mask = DibSpec::true_color(2, 1)
            .pixels(vec![0x0011_2233, 0x0044_5566])
            .without_mask()
            .build();

        let frame = decode_image(
            &without_mask,
            &declared_for(&without_mask),
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(frame.pixels(), &[0xff11_2233, 0xff44_5566]);
    }

    #[test]
    fn declared_dimensions_win_over_header() {
        let blob = DibSpec::indexed(8, 4, 1, vec![[0, 0, 0], [255, 255, 255]])
            .pixels(vec![1; 32])
            .build();

        let declared = DeclaredImage {
            width: Some(8),
            height: Some(2),
            ..declared_for(&blob)
        };
        let frame = decode_image(&blob, &declared, &DecodeOptions::default()).unwrap();

        assert_eq!(frame.dimensions(), (8, 2));
    }

    #[test]
    fn declared_color_count_wins_over_header() {
        // header says 8 bpp, directory says 2 colors: read as 1 bpp
        let mut spec = DibSpec::indexed(8, 1, 1, vec![[0, 0, 0], [255, 255, 255]])
            .pixels(vec![1, 0, 0, 0, 0, 0, 0, 1]);
        spec.header_bit_count = Some(8);
        let blob = spec.build();

        let declared = DeclaredImage {
            color_count: Some(2),
            ..declared_for(&blob)
        };
        let frame = decode_image(&blob, &declared, &DecodeOptions::default()).unwrap();

        assert_eq!(frame.pixel(0, 0), Some(0xffff_ffff));
        assert_eq!(frame.pixel(1, 0), Some(0xff00_0000));
        assert_eq!(frame.pixel(7, 0), Some(0xffff_ffff));
    }

    #[test]
    fn truncated_planes_are_reported() {
        let blob = DibSpec::indexed(16, 16, 8, testing::ramp_palette(256))
            .pixels(vec![0; 256])
            .build();
        let cut = &blob[..blob.len() - 10];

        assert!(matches!(
            decode_image(cut, &declared_for(cut), &DecodeOptions::default()),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn unsupported_depth_and_encoding() {
        let mut spec = DibSpec::true_color(1, 1).pixels(vec![0]);
        spec.header_bit_count = Some(24);
        let blob = spec.build();

        assert!(matches!(
            decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()),
            Err(DecodeError::UnsupportedColorDepth(_))
        ));

        let junk = [0x42, 0x4d, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_image(&junk, &declared_for(&junk), &DecodeOptions::default()),
            Err(DecodeError::UnsupportedImageEncoding { .. })
        ));
    }

    #[test]
    fn png_entries_are_delegated() {
        let blob = testing::tiny_png();
        let frame = decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()).unwrap();

        assert_eq!(frame.dimensions(), (2, 1));
        assert_eq!(frame.pixels(), &[0xffff_0000, 0x8000_00ff]);
    }

    #[test]
    fn zero_sized_images_are_rejected() {
        // zero in both the directory entry and the header
        let blob = DibSpec::indexed(0, 4, 1, vec![[0, 0, 0], [255, 255, 255]]).build();

        assert!(matches!(
            decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()),
            Err(DecodeError::InvalidFrame(_))
        ));

        let blob = DibSpec::true_color(4, 0).build();

        assert!(matches!(
            decode_image(&blob, &declared_for(&blob), &DecodeOptions::default()),
            Err(DecodeError::InvalidFrame(_))
        ));
    }

    #[test]
    fn oversized_images_are_rejected() {
        let blob = DibSpec::true_color(4, 4).pixels(vec![0; 16]).build();
        let options = DecodeOptions::default().with_max_dimension(3);

        assert!(matches!(
            decode_image(&blob, &declared_for(&blob), &options),
            Err(DecodeError::ImageTooLarge { max: 3, .. })
        ));
    }
}
