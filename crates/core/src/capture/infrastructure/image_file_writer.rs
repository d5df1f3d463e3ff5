use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::capture::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Writes frames with the `image` crate. Gray and RGBA frames are
/// converted to RGB first.
#[derive(Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rgb = frame
            .to_rgb()
            .ok_or_else(|| format!("cannot write a {}-channel frame", frame.channels()))?;
        let (width, height) = (rgb.width(), rgb.height());
        let img = RgbImage::from_raw(width, height, rgb.data().to_vec())
            .ok_or("frame buffer does not match its dimensions")?;

        let img = match size {
            Some((w, h)) if (w, h) != (width, height) => {
                imageops::resize(&img, w, h, FilterType::Triangle)
            }
            _ => img,
        };

        img.save(path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}
