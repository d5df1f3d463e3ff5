use image::{ImageBuffer, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::analysis::domain::emotion::DetectionResult;
use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::frame::Frame;

use super::bitmap_font::{self, GLYPH_HEIGHT};

pub const BOX_THICKNESS: i32 = 2;
pub const LABEL_SCALE: u32 = 3;
/// Gap between the label baseline and the top edge of the box.
pub const LABEL_OFFSET: i32 = 10;

/// Draws a colored box around each face and its caption above the
/// top-left corner. Expects an RGB frame.
#[derive(Clone, Debug, Default)]
pub struct BoxLabelAnnotator;

impl BoxLabelAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl FrameAnnotator for BoxLabelAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        detections: &[DetectionResult],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("annotator expects RGB, got {} channels", frame.channels()).into());
        }
        let (width, height) = (frame.width(), frame.height());
        let mut image: ImageBuffer<Rgb<u8>, &mut [u8]> =
            ImageBuffer::from_raw(width, height, frame.data_mut())
                .ok_or("frame buffer does not match its dimensions")?;

        for det in detections {
            let color = Rgb(det.emotion.color());
            let r = det.region;
            // Corners are inclusive, so the outer ring spans width + 1 pixels.
            for inset in 0..BOX_THICKNESS {
                let w = r.width + 1 - 2 * inset;
                let h = r.height + 1 - 2 * inset;
                if w <= 0 || h <= 0 {
                    break;
                }
                let rect = Rect::at(r.x + inset, r.y + inset).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(&mut image, rect, color);
            }

            let caption = det.classification().caption();
            let top = r.y - LABEL_OFFSET - (GLYPH_HEIGHT * LABEL_SCALE) as i32;
            bitmap_font::draw_text(&mut image, r.x, top, &caption, color, LABEL_SCALE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion::{Classification, EmotionLabel};
    use crate::shared::region::Region;

    fn blank(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 3, 0)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn detection(region: Region, label: EmotionLabel) -> DetectionResult {
        DetectionResult::new(region, Classification::new(label, 75.0))
    }

    #[test]
    fn test_box_is_two_pixels_thick() {
        let mut frame = blank(120, 120);
        let det = detection(Region::new(40, 50, 30, 30), EmotionLabel::Happy);
        BoxLabelAnnotator::new().annotate(&mut frame, &[det]).unwrap();
        let green = [0, 255, 0];
        assert_eq!(pixel(&frame, 40, 60), green);
        assert_eq!(pixel(&frame, 41, 60), green);
        assert_eq!(pixel(&frame, 42, 60), [0, 0, 0]);
        // Far corner is inclusive.
        assert_eq!(pixel(&frame, 70, 80), green);
        assert_eq!(pixel(&frame, 55, 65), [0, 0, 0]);
    }

    #[test]
    fn test_caption_sits_above_box() {
        let mut frame = blank(200, 120);
        let det = detection(Region::new(20, 60, 40, 40), EmotionLabel::Sad);
        BoxLabelAnnotator::new().annotate(&mut frame, &[det]).unwrap();
        let blue = [0, 0, 255];
        let top = 60 - LABEL_OFFSET as u32 - GLYPH_HEIGHT * LABEL_SCALE;
        let in_label = (top..60 - LABEL_OFFSET as u32)
            .flat_map(|y| (20..120).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&frame, x, y) == blue)
            .count();
        assert!(in_label > 0);
        let above_label = (0..top)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&frame, x, y) != [0, 0, 0])
            .count();
        assert_eq!(above_label, 0);
    }

    #[test]
    fn test_face_at_edge_does_not_panic() {
        let mut frame = blank(50, 50);
        let det = detection(Region::new(0, 0, 50, 50), EmotionLabel::Angry);
        BoxLabelAnnotator::new().annotate(&mut frame, &[det]).unwrap();
        assert_eq!(pixel(&frame, 0, 0), [255, 0, 0]);
    }

    #[test]
    fn test_no_detections_leaves_frame_untouched() {
        let mut frame = blank(30, 30);
        let before = frame.clone();
        BoxLabelAnnotator::new().annotate(&mut frame, &[]).unwrap();
        assert_eq!(frame, before);
    }

    #[test]
    fn test_rejects_non_rgb_frame() {
        let mut frame = Frame::new(vec![0u8; 100], 10, 10, 1, 0);
        assert!(BoxLabelAnnotator::new().annotate(&mut frame, &[]).is_err());
    }
}
