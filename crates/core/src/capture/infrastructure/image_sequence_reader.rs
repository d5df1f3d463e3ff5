use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_reader::FrameReader;
use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;

use super::{decode, is_image};

/// Plays a directory of images back as a live frame stream, in file-name
/// order. Each file is decoded only when its frame is pulled, so an
/// unreadable file fails that frame alone.
#[derive(Default)]
pub struct ImageSequenceReader {
    files: Vec<PathBuf>,
}

impl ImageSequenceReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameReader for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let mut files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| format!("cannot read frame directory {}: {e}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        if files.is_empty() {
            return Err(format!("no images found in {}", path.display()).into());
        }
        files.sort();

        let (width, height) = files
            .iter()
            .find_map(|f| image::image_dimensions(f).ok())
            .unwrap_or((0, 0));
        log::info!("Frame sequence {}: {} frames", path.display(), files.len());

        let metadata = SourceMetadata {
            width,
            height,
            total_frames: files.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.files = files;
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.files.is_empty() {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        }
        Box::new(
            self.files
                .iter()
                .enumerate()
                .map(|(index, path)| decode(path, index)),
        )
    }

    fn close(&mut self) {
        self.files.clear();
    }
}
