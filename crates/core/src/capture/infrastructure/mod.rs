pub mod image_file_reader;
pub mod image_file_writer;
pub mod image_sequence_reader;

use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// True when the path carries one of the supported image extensions.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}
