//! Module for [`clap`] code.
//!
//! This contains the [`Args`] struct, which has the [`Parser`]
//! trait, and the [`ParsedArgs`] struct, which is just plain old data.

use crate::{CursorArtifact, CursorFormat, decode_path, fs_utils};

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::{ImageFormat, RgbaImage};

/// Raw arguments from CLI. Has the [`Parser`] trait.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The path to an ICO/CUR/ANI file, or a directory containing them.
    path: String,

    /// Forces sequential processing (i.e, no `rayon`).
    ///
    /// Sequential processing is used by default for light workloads.
    #[arg(long)]
    sequential: bool,

    /// Forces `rayon` usage.
    ///
    /// This is enabled by default when decoding a large amount of cursors.
    #[arg(long)]
    parallel: bool,

    /// Writes every decoded frame as a PNG into this directory.
    ///
    /// If the provided path doesn't exist yet, this
    /// attempts to create it (including parents).
    #[arg(short, long, value_name = "DIR")]
    dump: Option<String>,

    /// Logs every chunk and frame as it's decoded.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Default log filter, used when `RUST_LOG` isn't set.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

/// Parsed CLI arguments.
#[derive(Debug)]
pub struct ParsedArgs {
    /// Every file to decode.
    pub cursor_paths: Vec<PathBuf>,
    /// Whether to use `rayon` or not.
    pub use_rayon: bool,
    /// Where to dump frames, if anywhere.
    pub dump: Option<PathBuf>,
}

impl ParsedArgs {
    /// Parses `args`, collecting the files to decode.
    ///
    /// ## Errors
    ///
    /// - If the input path is a directory without cursor files, or a
    ///   file without one of the [`CursorFormat::EXTENSIONS`].
    /// - If the dump directory can't be created.
    pub fn from_args(args: Args) -> Result<Self> {
        // If the number of cursors being decoded is greater
        // than or equal to this, use `rayon` for decoding.
        const USE_RAYON_BOUND: usize = 100;

        let cursor_paths = Self::validate_cursor_path(&args.path)?;

        let use_rayon =
            (!args.sequential) && (args.parallel || cursor_paths.len() >= USE_RAYON_BOUND);

        log::info!(
            "decoding {} cursor(s) {}",
            cursor_paths.len(),
            if use_rayon {
                "in parallel, with rayon"
            } else {
                "sequentially"
            }
        );

        let dump = args
            .dump
            .map(|dir| {
                fs::create_dir_all(&dir).with_context(|| format!("failed to create dump={dir}"))?;
                anyhow::Ok(PathBuf::from(dir))
            })
            .transpose()?;

        Ok(Self {
            cursor_paths,
            use_rayon,
            dump,
        })
    }

    /// Helper function for validating [`Args::path`].
    fn validate_cursor_path(path: &str) -> Result<Vec<PathBuf>> {
        let path_buf = PathBuf::from(path);

        if path_buf.is_dir() {
            let mut cursor_paths =
                fs_utils::find_extensions_icase(&path_buf, &CursorFormat::EXTENSIONS)?;

            if cursor_paths.is_empty() {
                bail!(
                    "no ICO/CUR/ANI files found in {path}, note that sub-directories aren't checked"
                );
            }

            // deterministic output order
            cursor_paths.sort();
            return Ok(cursor_paths);
        } else if path_buf.is_file() {
            CursorFormat::from_path(&path_buf)
                .with_context(|| format!("provided file {path} is not a cursor file"))?;

            return Ok(vec![path_buf]);
        }

        // metadata errors are coerced to false in the `.is_*()`
        // methods. try passing `/dev/null` for instance
        bail!("couldn't coerce {path} as a dir or file")
    }
}

/// One-line description of a decoded cursor.
#[must_use]
pub fn summarize(path: &Path, cursor: &CursorArtifact) -> String {
    let (width, height) = cursor.dimensions();
    let (hx, hy) = cursor.hotspot();

    let timing = if cursor.is_animated() {
        format!(
            "{} frames, {}ms loop",
            cursor.frame_count(),
            cursor.total_duration_ms()
        )
    } else {
        "static".to_string()
    };

    format!(
        "{}: {width}x{height}, hotspot=({hx}, {hy}), {timing}",
        path.display()
    )
}

/// Writes each frame of `cursor` to `out` as `{stem}_{i}.png`, top row first.
///
/// ## Errors
///
/// If encoding or writing a frame fails.
pub fn dump_frames(cursor: &CursorArtifact, out: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let (width, height) = cursor.dimensions();
    let mut written = Vec::with_capacity(cursor.frame_count() as usize);

    for i in 0..cursor.frame_count() as usize {
        let rgba = cursor
            .to_rgba_top_down(i)
            .with_context(|| format!("frame {i} missing from {stem}"))?;

        let image = RgbaImage::from_raw(width, height, rgba)
            .with_context(|| format!("frame {i} of {stem} doesn't fit {width}x{height}"))?;

        let path = out.join(format!("{stem}_{i}.png"));

        image
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))?;

        written.push(path);
    }

    Ok(written)
}

/// Decodes the file at `path`, dumping frames to `dump` if given.
///
/// Returns the summary line.
///
/// ## Errors
///
/// If decoding or dumping fails.
pub fn process_cursor(path: &Path, dump: Option<&Path>) -> Result<String> {
    let cursor =
        decode_path(path).with_context(|| format!("failed to decode {}", path.display()))?;

    if let Some(out) = dump {
        let stem = path
            .file_stem()
            .map_or_else(|| "cursor".into(), |s| s.to_string_lossy());

        let written = dump_frames(&cursor, out, &stem)?;
        log::debug!("wrote {} frame(s) for {}", written.len(), path.display());
    }

    Ok(summarize(path, &cursor))
}
