//! Parsers for the on-disk formats, plus [`CursorFormat`] to pick one.

pub mod ani;
pub mod bytes;
pub mod dib;
pub mod ico;
pub mod png;

use self::ico::ResourceType;
use crate::error::{DecodeError, Result};

use std::path::Path;

/// The container formats that can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorFormat {
    /// Static icon (`.ico`).
    Ico,
    /// Static cursor (`.cur`).
    Cur,
    /// Animated cursor (`.ani`).
    Ani,
}

impl CursorFormat {
    /// Every supported extension, lowercase and without the dot.
    pub const EXTENSIONS: [&str; 3] = ["ico", "cur", "ani"];

    /// Parses a file extension (without the dot), ignoring case.
    ///
    /// ## Errors
    ///
    /// [`DecodeError::UnsupportedExtension`] for anything
    /// not in [`Self::EXTENSIONS`].
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ico" => Ok(Self::Ico),
            "cur" => Ok(Self::Cur),
            "ani" => Ok(Self::Ani),
            _ => Err(DecodeError::UnsupportedExtension(ext.to_string())),
        }
    }

    /// Parses the extension of `path`.
    ///
    /// ## Errors
    ///
    /// [`DecodeError::UnsupportedExtension`] if there's no
    /// (UTF-8) extension, or it isn't supported.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| DecodeError::UnsupportedExtension(path.display().to_string()))?;

        Self::from_extension(ext)
    }

    /// The extension, lowercase and without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ico => "ico",
            Self::Cur => "cur",
            Self::Ani => "ani",
        }
    }

    /// How the hotspot of a static container is interpreted.
    ///
    /// [`None`] for ANI, where each embedded icon decides.
    #[must_use]
    pub const fn resource_type(self) -> Option<ResourceType> {
        match self {
            Self::Ico => Some(ResourceType::Icon),
            Self::Cur => Some(ResourceType::Cursor),
            Self::Ani => None,
        }
    }
}
