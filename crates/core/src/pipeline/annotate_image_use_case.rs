use std::path::Path;

use crate::analysis::domain::emotion::DetectionResult;
use crate::capture::domain::frame_reader::FrameReader;
use crate::capture::domain::image_writer::ImageWriter;
use crate::pipeline::emotion_detector::{DetectionOutcome, EmotionDetector};
use crate::storage::domain::emotion_store::EmotionStore;

/// Single-image pipeline: read → detect → write → persist labels.
pub struct AnnotateImageUseCase {
    reader: Box<dyn FrameReader>,
    image_writer: Box<dyn ImageWriter>,
    detector: EmotionDetector,
    store: Option<Box<dyn EmotionStore>>,
}

impl AnnotateImageUseCase {
    pub fn new(
        reader: Box<dyn FrameReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: EmotionDetector,
        store: Option<Box<dyn EmotionStore>>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            store,
        }
    }

    /// Writes the annotated image to `output_path` and returns the faces
    /// found. When detection fails the input is written unchanged and no
    /// faces are reported.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<Vec<DetectionResult>, Box<dyn std::error::Error>> {
        self.reader.open(input_path)?;
        let frame = self.reader.frames().next().ok_or("No frames in image")??;
        self.reader.close();

        let outcome = self.detector.detect(&frame);
        if let DetectionOutcome::Failure { error, .. } = &outcome {
            log::warn!("{}: {error}; writing input unchanged", input_path.display());
        }
        self.image_writer.write(output_path, outcome.frame(), None)?;
        log::info!("Wrote {}", output_path.display());

        if let Some(store) = self.store.as_mut() {
            for d in outcome.detections() {
                store.record(d.emotion)?;
            }
        }

        match outcome {
            DetectionOutcome::Success { detections, .. } => Ok(detections),
            DetectionOutcome::Failure { .. } => Ok(Vec::new()),
        }
    }
}
