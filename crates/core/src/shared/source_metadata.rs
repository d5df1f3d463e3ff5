use std::path::PathBuf;

/// Describes an opened frame source: a single image or a frame sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}
