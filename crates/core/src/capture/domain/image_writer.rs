use std::path::Path;

use crate::shared::frame::Frame;

/// Render sink for annotated frames.
pub trait ImageWriter: Send {
    /// Encodes `frame` to `path`; the format follows the file extension.
    /// `size` rescales the output when given.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
