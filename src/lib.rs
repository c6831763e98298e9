#![doc = include_str!("../README.md")]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]

pub mod cli;
pub mod cursors;
pub mod error;
pub mod formats;
pub mod fs_utils;
pub mod options;

#[cfg(test)]
pub(crate) mod testing;

pub use cursors::artifact::CursorArtifact;
pub use error::{DecodeError, Result};
pub use formats::CursorFormat;
pub use options::DecodeOptions;

use cursors::assembler;
use formats::{
    ani::AniFile,
    ico::{IconDir, ResourceType},
};

use std::{fs, path::Path};

/// Decodes `bytes` as `format` with [`DecodeOptions::default`].
///
/// ## Errors
///
/// See [`decode_with`].
pub fn decode(bytes: &[u8], format: CursorFormat) -> Result<CursorArtifact> {
    decode_with(bytes, format, &DecodeOptions::default())
}

/// Decodes `bytes` as `format`.
///
/// Either the whole cursor decodes, or nothing does.
///
/// ## Errors
///
/// - [`DecodeError::InputTooLarge`] if `bytes` exceeds
///   [`DecodeOptions::max_input_len`], checked before parsing.
/// - Any error from parsing the container or decoding its images.
pub fn decode_with(
    bytes: &[u8],
    format: CursorFormat,
    options: &DecodeOptions,
) -> Result<CursorArtifact> {
    check_input_len(bytes.len(), options)?;

    match format.resource_type() {
        Some(kind) => decode_static(bytes, kind, options),
        None => decode_animated(bytes, options),
    }
}

/// Reads and decodes the file at `path`, picking the format from its extension.
///
/// ## Errors
///
/// - [`DecodeError::UnsupportedExtension`], before anything is read.
/// - [`DecodeError::Io`] if the file can't be read.
/// - See [`decode_with`].
pub fn decode_path(path: impl AsRef<Path>) -> Result<CursorArtifact> {
    let path = path.as_ref();
    let format = CursorFormat::from_path(path)?;
    let options = DecodeOptions::default();

    // skip reading files that would be rejected anyway
    let len = usize::try_from(fs::metadata(path)?.len()).unwrap_or(usize::MAX);
    check_input_len(len, &options)?;

    log::debug!("decoding {} as {format:?}", path.display());

    decode_with(&fs::read(path)?, format, &options)
}

fn check_input_len(len: usize, options: &DecodeOptions) -> Result<()> {
    if len > options.max_input_len {
        return Err(DecodeError::InputTooLarge {
            len,
            max: options.max_input_len,
        });
    }

    Ok(())
}

/// ICO/CUR: one directory, one frame.
fn decode_static(
    bytes: &[u8],
    kind: ResourceType,
    options: &DecodeOptions,
) -> Result<CursorArtifact> {
    let frame = IconDir::parse(bytes)?.decode_as(kind, options)?;
    assembler::assemble_static(frame, options)
}

/// ANI: every icon is decoded once, then sequenced by the timing plan.
fn decode_animated(bytes: &[u8], options: &DecodeOptions) -> Result<CursorArtifact> {
    let ani = AniFile::from_blob(bytes)?;

    let dirs = ani
        .icons
        .iter()
        .map(|icon| IconDir::parse(icon))
        .collect::<Result<Vec<_>>>()?;

    let plan = ani.timing_plan(&dirs);

    let frames = dirs
        .iter()
        .map(|dir| dir.decode(options))
        .collect::<Result<Vec<_>>>()?;

    assembler::assemble(&frames, &plan, options)
}
