use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::capture::domain::frame_reader::FrameReader;
use crate::capture::domain::image_writer::ImageWriter;
use crate::pipeline::emotion_detector::{DetectionOutcome, EmotionDetector};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::storage::domain::emotion_store::EmotionStore;

/// Totals for one finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub frames_processed: usize,
    pub frames_skipped: usize,
    pub faces: usize,
}

/// Frame-by-frame loop standing in for a camera feed: pull a frame, detect,
/// hand the annotated frame to the sink, persist labels. One frame is
/// finished before the next is pulled. Unreadable frames are skipped; a
/// frame that fails detection is written unannotated and stores nothing.
pub struct LiveSessionUseCase {
    reader: Box<dyn FrameReader>,
    image_writer: Box<dyn ImageWriter>,
    detector: EmotionDetector,
    store: Option<Box<dyn EmotionStore>>,
    logger: Box<dyn PipelineLogger>,
}

impl LiveSessionUseCase {
    pub fn new(
        reader: Box<dyn FrameReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: EmotionDetector,
        store: Option<Box<dyn EmotionStore>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            store,
            logger,
        }
    }

    pub fn detector(&self) -> &EmotionDetector {
        &self.detector
    }

    pub fn execute(
        &mut self,
        source: &Path,
        output_dir: &Path,
    ) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(source)?;
        let total = metadata.total_frames;
        self.logger.info(&format!(
            "Live session on {} ({total} frames) -> {}",
            source.display(),
            output_dir.display()
        ));

        let mut report = SessionReport::default();
        for (position, item) in self.reader.frames().enumerate() {
            self.logger.progress(position + 1, total);

            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    self.logger.skipped(position, &e.to_string());
                    report.frames_skipped += 1;
                    continue;
                }
            };

            let t0 = Instant::now();
            let outcome = self.detector.detect(&frame);
            self.logger
                .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

            // A failed frame still reaches the sink, unannotated.
            let t0 = Instant::now();
            self.image_writer
                .write(&frame_path(output_dir, frame.index()), outcome.frame(), None)?;
            self.logger
                .timing("write", t0.elapsed().as_secs_f64() * 1000.0);

            let detections = match &outcome {
                DetectionOutcome::Success { detections, .. } => detections,
                DetectionOutcome::Failure { error, .. } => {
                    self.logger.skipped(frame.index(), &error.to_string());
                    report.frames_skipped += 1;
                    continue;
                }
            };

            if let Some(store) = self.store.as_mut() {
                let t0 = Instant::now();
                for d in detections {
                    store.record(d.emotion)?;
                }
                self.logger
                    .timing("store", t0.elapsed().as_secs_f64() * 1000.0);
            }

            self.logger.metric("faces", detections.len() as f64);
            report.frames_processed += 1;
            report.faces += detections.len();
        }

        self.reader.close();
        self.logger.summary();
        Ok(report)
    }
}

fn frame_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("frame_{index:06}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion::EmotionLabel;
    use crate::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::test_support::{
        StubImageReader, StubImageWriter, StubLocator, StubStore,
    };
    use crate::shared::detector_settings::DetectorSettings;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use std::sync::{Arc, Mutex};

    struct RecordingLogger {
        skipped: Arc<Mutex<Vec<usize>>>,
        progress: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.progress.lock().unwrap().push((current, total));
        }
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn skipped(&mut self, frame_index: usize, _reason: &str) {
            self.skipped.lock().unwrap().push(frame_index);
        }
        fn info(&mut self, _message: &str) {}
    }

    fn frame(w: u32, h: u32, index: usize) -> Frame {
        Frame::new(vec![100; (w * h * 3) as usize], w, h, 3, index)
    }

    fn detector(faces: Vec<Region>) -> EmotionDetector {
        EmotionDetector::new(
            Box::new(StubLocator::returning(faces)),
            Box::new(StubLocator::returning(vec![])),
            Box::new(StubLocator::returning(vec![])),
            Box::new(BoxLabelAnnotator::new()),
            DetectorSettings::default(),
        )
    }

    #[test]
    fn test_every_frame_is_written_in_order() {
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let mut uc = LiveSessionUseCase::new(
            Box::new(StubImageReader::new(vec![
                frame(80, 80, 0),
                frame(80, 80, 1),
                frame(80, 80, 2),
            ])),
            Box::new(writer),
            detector(vec![Region::new(10, 30, 40, 40)]),
            None,
            Box::new(NullPipelineLogger),
        );
        let report = uc.execute(Path::new("frames"), Path::new("out")).unwrap();

        assert_eq!(
            report,
            SessionReport {
                frames_processed: 3,
                frames_skipped: 0,
                faces: 3
            }
        );
        let written = written.lock().unwrap();
        let paths: Vec<_> = written.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/frame_000000.png"),
                PathBuf::from("out/frame_000001.png"),
                PathBuf::from("out/frame_000002.png"),
            ]
        );
        assert_eq!(
            uc.detector().counter().snapshot().get(EmotionLabel::Neutral),
            3
        );
    }

    #[test]
    fn test_unreadable_frames_are_skipped() {
        let skipped = Arc::new(Mutex::new(Vec::new()));
        let progress = Arc::new(Mutex::new(Vec::new()));
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let mut uc = LiveSessionUseCase::new(
            Box::new(StubImageReader::with_items(vec![
                Ok(frame(40, 40, 0)),
                Err("camera hiccup".into()),
                Ok(frame(40, 40, 2)),
            ])),
            Box::new(writer),
            detector(vec![]),
            None,
            Box::new(RecordingLogger {
                skipped: skipped.clone(),
                progress: progress.clone(),
            }),
        );
        let report = uc.execute(Path::new("frames"), Path::new("out")).unwrap();

        assert_eq!(report.frames_processed, 2);
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(*skipped.lock().unwrap(), vec![1]);
        assert_eq!(*progress.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(written.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_detection_writes_frame_unannotated_and_continues() {
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let store = StubStore::new();
        let rows = store.rows.clone();
        // The face fits 100x100 frames but not 40x40 ones.
        let mut uc = LiveSessionUseCase::new(
            Box::new(StubImageReader::new(vec![
                frame(100, 100, 0),
                frame(40, 40, 1),
                frame(100, 100, 2),
            ])),
            Box::new(writer),
            detector(vec![Region::new(20, 40, 50, 50)]),
            Some(Box::new(store)),
            Box::new(NullPipelineLogger),
        );
        let report = uc.execute(Path::new("frames"), Path::new("out")).unwrap();

        assert_eq!(report.frames_processed, 2);
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(report.faces, 2);
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[1].0, PathBuf::from("out/frame_000001.png"));
        assert_eq!(written[1].1, frame(40, 40, 1));
        assert_eq!(rows.lock().unwrap().len(), 2);
        assert_eq!(uc.detector().counter().snapshot().total(), 2);
    }

    #[test]
    fn test_out_of_bounds_face_still_reaches_sink() {
        let writer = StubImageWriter::new();
        let written = writer.written.clone();
        let mut uc = LiveSessionUseCase::new(
            Box::new(StubImageReader::new(vec![frame(80, 80, 0)])),
            Box::new(writer),
            detector(vec![Region::new(60, 60, 50, 50)]),
            None,
            Box::new(NullPipelineLogger),
        );
        let report = uc.execute(Path::new("frames"), Path::new("out")).unwrap();

        assert_eq!(
            report,
            SessionReport {
                frames_processed: 0,
                frames_skipped: 1,
                faces: 0
            }
        );
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].1, frame(80, 80, 0));
    }

    #[test]
    fn test_labels_are_persisted_per_face() {
        let store = StubStore::new();
        let rows = store.rows.clone();
        let mut uc = LiveSessionUseCase::new(
            Box::new(StubImageReader::new(vec![frame(120, 120, 0), frame(120, 120, 1)])),
            Box::new(StubImageWriter::new()),
            detector(vec![Region::new(0, 30, 40, 40), Region::new(60, 30, 40, 40)]),
            Some(Box::new(store)),
            Box::new(NullPipelineLogger),
        );
        uc.execute(Path::new("frames"), Path::new("out")).unwrap();
        assert_eq!(rows.lock().unwrap().len(), 4);
    }
}
