//! Frames, timing and the assembled [`artifact::CursorArtifact`].

pub mod artifact;
pub mod assembler;
pub mod raw_frame;
pub mod timing;
