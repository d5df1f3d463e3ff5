use crate::analysis::domain::emotion::DetectionResult;
use crate::shared::frame::Frame;

/// Domain interface for drawing classification results onto a frame.
///
/// Implementations modify the frame in place; callers pass a copy when the
/// original must be kept.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        detections: &[DetectionResult],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
