use std::path::Path;

use crate::capture::domain::frame_reader::FrameReader;
use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;

use super::decode;

/// Adapts a single image file to the [`FrameReader`] interface as a
/// one-frame source. Pixels are decoded to RGB.
#[derive(Default)]
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let frame = decode(path, 0)?;
        let metadata = SourceMetadata {
            width: frame.width(),
            height: frame.height(),
            total_frames: 1,
            source_path: Some(path.to_path_buf()),
        };
        self.frame = Some(frame);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
