//! Builders for the blobs used in tests.
//!
//! Everything is built in-memory so that tests never depend on fixtures
//! being present on disk. Pixels are always given top-down here, the
//! builders take care of storing them bottom-up.

use crate::formats::{
    ani::AniHeader,
    dib::{BitmapInfoHeader, DIB_HEADER_SIZE, bytes_per_row},
    ico::{IconDirEntry, IconDirHeader},
};

use std::io::Cursor;

use binrw::BinWrite;
use image::{ImageFormat, Rgba, RgbaImage};

/// Serializes a little-endian binrw record.
pub(crate) fn to_bytes<T>(record: &T) -> Vec<u8>
where
    T: for<'a> BinWrite<Args<'a> = ()> + binrw::meta::WriteEndian,
{
    let mut out = Cursor::new(Vec::new());
    record.write(&mut out).unwrap();
    out.into_inner()
}

/// Palette where entry `i` is the gray `(i, i, i)`.
pub(crate) fn ramp_palette(len: usize) -> Vec<[u8; 3]> {
    (0..len)
        .map(|i| {
            let v = u8::try_from(i).unwrap();
            [v, v, v]
        })
        .collect()
}

/// Encodes a 2x1 PNG: red (opaque), then half-transparent blue.
pub(crate) fn tiny_png() -> Vec<u8> {
    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 255, 128]));

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Describes a DIB (header + palette + XOR plane + AND plane).
pub(crate) struct DibSpec {
    width: u32,
    height: u32,
    bits: u16,
    palette: Vec<[u8; 3]>,
    /// Palette indices, or ARGB for 32 bpp. Top-down.
    pixels: Vec<u32>,
    /// `true` means transparent. Top-down. [`None`] means no AND plane.
    mask: Option<Vec<bool>>,
    /// Fourth byte of each palette entry.
    pub palette_reserved: u8,
    /// Written to the header instead of the real bit count.
    pub header_bit_count: Option<u16>,
}

impl DibSpec {
    /// Palette-based image, `palette` given as (r, g, b).
    pub(crate) fn indexed(width: u32, height: u32, bits: u16, palette: Vec<[u8; 3]>) -> Self {
        Self {
            width,
            height,
            bits,
            palette,
            pixels: vec![0; (width * height) as usize],
            mask: Some(vec![false; (width * height) as usize]),
            palette_reserved: 0,
            header_bit_count: None,
        }
    }

    /// 32 bpp image.
    pub(crate) fn true_color(width: u32, height: u32) -> Self {
        Self::indexed(width, height, 32, Vec::new())
    }

    pub(crate) fn pixels(mut self, pixels: Vec<u32>) -> Self {
        assert_eq!(pixels.len(), (self.width * self.height) as usize);
        self.pixels = pixels;
        self
    }

    pub(crate) fn mask(mut self, mask: Vec<bool>) -> Self {
        assert_eq!(mask.len(), (self.width * self.height) as usize);
        self.mask = Some(mask);
        self
    }

    pub(crate) fn without_mask(mut self) -> Self {
        self.mask = None;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);

        let header = BitmapInfoHeader {
            size: DIB_HEADER_SIZE,
            width: self.width,
            height: self.height * 2,
            planes: 1,
            bit_count: self.header_bit_count.unwrap_or(self.bits),
            ..BitmapInfoHeader::default()
        };

        let mut out = to_bytes(&header);

        for [r, g, b] in &self.palette {
            out.extend_from_slice(&[*b, *g, *r, self.palette_reserved]);
        }

        let xor_stride = bytes_per_row(self.width, self.bits.into());

        for y in (0..h).rev() {
            let mut row = vec![0u8; xor_stride];

            for x in 0..w {
                let px = self.pixels[y * w + x];

                match self.bits {
                    1 => row[x / 8] |= u8::from(px != 0) << (7 - x % 8),
                    4 => row[x / 2] |= (px as u8 & 0x0f) << if x % 2 == 0 { 4 } else { 0 },
                    8 => row[x] = px as u8,
                    32 => {
                        let [a, r, g, b] = px.to_be_bytes();
                        row[x * 4..x * 4 + 4].copy_from_slice(&[b, g, r, a]);
                    }
                    bits => panic!("can't build {bits} bpp"),
                }
            }

            out.extend(row);
        }

        if let Some(mask) = &self.mask {
            let and_stride = bytes_per_row(self.width, 1);

            for y in (0..h).rev() {
                let mut row = vec![0u8; and_stride];

                for x in (0..w).filter(|x| mask[y * w + x]) {
                    row[x / 8] |= 0x80 >> (x % 8);
                }

                out.extend(row);
            }
        }

        out
    }
}

/// Opaque 1 bpp black/white image filled with palette `index` (0 or 1).
pub(crate) fn mono_dib(width: u32, height: u32, index: u32) -> Vec<u8> {
    DibSpec::indexed(width, height, 1, vec![[0, 0, 0], [255, 255, 255]])
        .pixels(vec![index; (width * height) as usize])
        .build()
}

/// One directory entry and the image it points to.
pub(crate) struct EntrySpec {
    pub entry: IconDirEntry,
    pub blob: Vec<u8>,
}

impl EntrySpec {
    pub(crate) fn icon(width: u8, height: u8, blob: Vec<u8>) -> Self {
        Self {
            entry: IconDirEntry {
                width,
                height,
                planes_or_hotspot_x: 1,
                bit_count_or_hotspot_y: 0,
                ..IconDirEntry::default()
            },
            blob,
        }
    }

    pub(crate) fn cursor(width: u8, height: u8, hotspot: (u16, u16), blob: Vec<u8>) -> Self {
        Self {
            entry: IconDirEntry {
                width,
                height,
                planes_or_hotspot_x: hotspot.0,
                bit_count_or_hotspot_y: hotspot.1,
                ..IconDirEntry::default()
            },
            blob,
        }
    }
}

/// Builds an ICO (`resource_type` = 1) or CUR (= 2) container.
///
/// Entry offsets and lengths are filled in.
pub(crate) fn icon_dir(resource_type: u16, entries: &[EntrySpec]) -> Vec<u8> {
    let header = IconDirHeader {
        reserved: 0,
        resource_type,
        count: u16::try_from(entries.len()).unwrap(),
    };

    let mut out = to_bytes(&header);
    let mut offset = 6 + 16 * entries.len();

    for spec in entries {
        let entry = IconDirEntry {
            byte_len: u32::try_from(spec.blob.len()).unwrap(),
            offset: u32::try_from(offset).unwrap(),
            ..spec.entry
        };

        out.extend(to_bytes(&entry));
        offset += spec.blob.len();
    }

    for spec in entries {
        out.extend_from_slice(&spec.blob);
    }

    out
}

/// Single-entry 1 bpp cursor filled with palette `index`.
pub(crate) fn mono_cur(size: u8, hotspot: (u16, u16), index: u32) -> Vec<u8> {
    let dib = mono_dib(size.into(), size.into(), index);
    icon_dir(2, &[EntrySpec::cursor(size, size, hotspot, dib)])
}

/// Pads every blob with zeros to the length of the longest one.
pub(crate) fn same_len(mut blobs: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let len = blobs.iter().map(Vec::len).max().unwrap_or_default();

    for blob in &mut blobs {
        blob.resize(len, 0);
    }

    blobs
}

/// Writes one RIFF chunk, padded to an even length.
pub(crate) fn chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&u32::try_from(data.len()).unwrap().to_le_bytes());
    out.extend_from_slice(data);

    if data.len() % 2 != 0 {
        out.push(0);
    }
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Describes an ANI file.
pub(crate) struct AniSpec {
    pub icons: Vec<Vec<u8>>,
    pub jiffy: u32,
    pub width: u32,
    pub height: u32,
    pub rate: Option<Vec<u32>>,
    pub sequence: Option<Vec<u32>>,
    /// Emits a "LIST"/"INFO" chunk before "anih".
    pub info: bool,
    /// Appended after the RIFF form, outside of its declared length.
    pub trailing: Vec<u8>,
}

impl AniSpec {
    pub(crate) fn new(icons: Vec<Vec<u8>>, jiffy: u32) -> Self {
        Self {
            icons,
            jiffy,
            width: 0,
            height: 0,
            rate: None,
            sequence: None,
            info: false,
            trailing: Vec::new(),
        }
    }

    pub(crate) fn header(&self) -> AniHeader {
        let num_frames = u32::try_from(self.icons.len()).unwrap();
        let num_steps = self
            .sequence
            .as_ref()
            .map_or(num_frames, |seq| u32::try_from(seq.len()).unwrap());

        AniHeader {
            header_size: 36,
            num_frames,
            num_steps,
            width: self.width,
            height: self.height,
            bit_count: 0,
            planes: 0,
            jiffy_rate: self.jiffy,
            flags: if self.sequence.is_some() { 3 } else { 1 },
        }
    }

    /// Chunks inside the "ACON" form.
    pub(crate) fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();

        if self.info {
            let mut info = b"INFO".to_vec();
            chunk(&mut info, b"INAM", b"spinner\0");
            chunk(&mut info, b"IART", b"someone\0");
            chunk(&mut body, b"LIST", &info);
        }

        chunk(&mut body, b"anih", &to_bytes(&self.header()));

        if let Some(rate) = &self.rate {
            chunk(&mut body, b"rate", &u32s(rate));
        }

        if let Some(seq) = &self.sequence {
            chunk(&mut body, b"seq ", &u32s(seq));
        }

        let mut fram = b"fram".to_vec();

        for icon in &self.icons {
            chunk(&mut fram, b"icon", icon);
        }

        chunk(&mut body, b"LIST", &fram);
        body
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        riff(b"ACON", &self.body(), &self.trailing)
    }
}

/// Wraps `body` in a RIFF form of type `form`.
pub(crate) fn riff(form: &[u8; 4], body: &[u8], trailing: &[u8]) -> Vec<u8> {
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&u32::try_from(body.len() + 4).unwrap().to_le_bytes());
    out.extend_from_slice(form);
    out.extend_from_slice(body);
    out.extend_from_slice(trailing);
    out
}
