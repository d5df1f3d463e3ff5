use std::sync::Arc;

use image::GrayImage;
use imageproc::contrast::equalize_histogram;
use ndarray::Array2;
use thiserror::Error;

use crate::analysis::domain::emotion::DetectionResult;
use crate::analysis::domain::emotion_classifier::EmotionClassifier;
use crate::analysis::domain::emotion_counter::EmotionCounter;
use crate::analysis::domain::face_bands::FaceBands;
use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
use crate::detection::domain::region_locator::RegionLocator;
use crate::detection::infrastructure::cascade_locator::CascadeSet;
use crate::shared::detector_settings::DetectorSettings;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("frame has no pixels")]
    EmptyFrame,
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("face region {0:?} lies outside the frame")]
    RegionOutOfBounds(Region),
    #[error("failed to annotate frame: {0}")]
    Annotation(String),
}

/// Result of one detection call. A failure hands back the input frame
/// untouched.
#[derive(Debug)]
pub enum DetectionOutcome {
    Success {
        frame: Frame,
        detections: Vec<DetectionResult>,
    },
    Failure {
        frame: Frame,
        error: DetectionError,
    },
}

impl DetectionOutcome {
    pub fn frame(&self) -> &Frame {
        match self {
            DetectionOutcome::Success { frame, .. } | DetectionOutcome::Failure { frame, .. } => {
                frame
            }
        }
    }

    pub fn detections(&self) -> &[DetectionResult] {
        match self {
            DetectionOutcome::Success { detections, .. } => detections,
            DetectionOutcome::Failure { .. } => &[],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DetectionOutcome::Success { .. })
    }
}

/// Finds faces in a frame, classifies each one and draws the results.
///
/// Every successfully processed face bumps the shared [`EmotionCounter`].
/// Counts only move once the whole frame has succeeded.
pub struct EmotionDetector {
    face_locator: Box<dyn RegionLocator>,
    eye_locator: Box<dyn RegionLocator>,
    smile_locator: Box<dyn RegionLocator>,
    annotator: Box<dyn FrameAnnotator>,
    classifier: EmotionClassifier,
    settings: DetectorSettings,
    counter: Arc<EmotionCounter>,
}

impl EmotionDetector {
    pub fn new(
        face_locator: Box<dyn RegionLocator>,
        eye_locator: Box<dyn RegionLocator>,
        smile_locator: Box<dyn RegionLocator>,
        annotator: Box<dyn FrameAnnotator>,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            face_locator,
            eye_locator,
            smile_locator,
            annotator,
            classifier: EmotionClassifier::new(settings.edges),
            settings,
            counter: Arc::new(EmotionCounter::new()),
        }
    }

    /// Detector over the three Haar cascades with box-and-label drawing.
    pub fn with_cascades(cascades: CascadeSet, settings: DetectorSettings) -> Self {
        Self::new(
            Box::new(cascades.face),
            Box::new(cascades.eye),
            Box::new(cascades.smile),
            Box::new(BoxLabelAnnotator::new()),
            settings,
        )
    }

    pub fn counter(&self) -> Arc<EmotionCounter> {
        Arc::clone(&self.counter)
    }

    pub fn detect(&self, frame: &Frame) -> DetectionOutcome {
        match self.process(frame) {
            Ok((annotated, detections)) => {
                for d in &detections {
                    self.counter.increment(d.emotion);
                }
                DetectionOutcome::Success {
                    frame: annotated,
                    detections,
                }
            }
            Err(error) => {
                log::error!("Emotion detection failed on frame {}: {error}", frame.index());
                DetectionOutcome::Failure {
                    frame: frame.clone(),
                    error,
                }
            }
        }
    }

    fn process(&self, frame: &Frame) -> Result<(Frame, Vec<DetectionResult>), DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }
        let unsupported = || DetectionError::UnsupportedChannels(frame.channels());
        let gray = frame.to_gray().ok_or_else(unsupported)?;
        let mut output = frame.to_rgb().ok_or_else(unsupported)?;

        let plane = if self.settings.equalize_histogram {
            equalize(gray)
        } else {
            gray
        };
        let plane = plane.view();

        let faces = self.face_locator.locate(plane, &self.settings.face);
        log::debug!("Frame {}: {} face(s)", frame.index(), faces.len());

        let mut detections = Vec::with_capacity(faces.len());
        for face in faces {
            let face_pixels = face
                .crop(&plane)
                .ok_or(DetectionError::RegionOutOfBounds(face))?;
            let bands = FaceBands::split(face_pixels);

            let eyes = self.eye_locator.locate(bands.upper, &self.settings.eyes);
            let mut smiles = self
                .smile_locator
                .locate(bands.lower, &self.settings.smile_primary);
            smiles.extend(
                self.smile_locator
                    .locate(bands.lower, &self.settings.smile_secondary),
            );

            let (classification, m) = self.classifier.classify(&bands, &eyes, &smiles);
            log::debug!(
                "Face {:?}: mean {:.1} std {:.1} edge {:.1}, {} eye(s), {} smile(s) -> {}",
                face,
                m.mean,
                m.std,
                m.edge,
                m.eye_count,
                m.smile_count,
                classification.caption()
            );
            detections.push(DetectionResult::new(face, classification));
        }

        self.annotator
            .annotate(&mut output, &detections)
            .map_err(|e| DetectionError::Annotation(e.to_string()))?;
        Ok((output, detections))
    }
}

fn equalize(gray: Array2<u8>) -> Array2<u8> {
    let (rows, cols) = gray.dim();
    let pixels: Vec<u8> = gray.iter().copied().collect();
    let Some(img) = GrayImage::from_raw(cols as u32, rows as u32, pixels) else {
        return gray;
    };
    let equalized = equalize_histogram(&img).into_raw();
    Array2::from_shape_vec((rows, cols), equalized).unwrap_or(gray)
}
