use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;

/// A source of frames: one still image or a stream standing in for a
/// camera.
///
/// A failed read surfaces as an `Err` item and the stream continues; the
/// iterator ending means the source is exhausted.
pub trait FrameReader: Send {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>>;

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
