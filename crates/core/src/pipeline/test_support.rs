//! Stubs for the pipeline trait seams, shared by the use case tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ndarray::ArrayView2;

use crate::analysis::domain::emotion::EmotionLabel;
use crate::capture::domain::frame_reader::FrameReader;
use crate::capture::domain::image_writer::ImageWriter;
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::region_locator::RegionLocator;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::source_metadata::SourceMetadata;
use crate::storage::domain::emotion_store::EmotionStore;

/// Returns the same regions for every call and records what it was asked.
pub struct StubLocator {
    regions: Vec<Region>,
    pub calls: Arc<Mutex<Vec<(usize, usize, DetectionParams)>>>,
}

impl StubLocator {
    pub fn returning(regions: Vec<Region>) -> Self {
        Self {
            regions,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RegionLocator for StubLocator {
    fn locate(&self, image: ArrayView2<'_, u8>, params: &DetectionParams) -> Vec<Region> {
        let (rows, cols) = image.dim();
        self.calls.lock().unwrap().push((rows, cols, *params));
        self.regions.clone()
    }
}

/// Yields pre-baked frames; `Err` items simulate unreadable frames.
pub struct StubImageReader {
    items: Vec<Result<Frame, String>>,
}

impl StubImageReader {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self::with_items(frames.into_iter().map(Ok).collect())
    }

    pub fn with_items(items: Vec<Result<Frame, String>>) -> Self {
        Self { items }
    }
}

impl FrameReader for StubImageReader {
    fn open(&mut self, _path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let first = self.items.iter().find_map(|i| i.as_ref().ok());
        Ok(SourceMetadata {
            width: first.map_or(0, Frame::width),
            height: first.map_or(0, Frame::height),
            total_frames: self.items.len(),
            source_path: None,
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        Box::new(
            std::mem::take(&mut self.items)
                .into_iter()
                .map(|item| item.map_err(Into::into)),
        )
    }

    fn close(&mut self) {
        self.items.clear();
    }
}

pub struct StubImageWriter {
    pub written: Arc<Mutex<Vec<(PathBuf, Frame)>>>,
}

impl StubImageWriter {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ImageWriter for StubImageWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        _size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), frame.clone()));
        Ok(())
    }
}

pub struct StubStore {
    pub rows: Arc<Mutex<Vec<String>>>,
}

impl StubStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EmotionStore for StubStore {
    fn record(&mut self, emotion: EmotionLabel) -> Result<(), Box<dyn std::error::Error>> {
        self.rows.lock().unwrap().push(emotion.as_str().to_string());
        Ok(())
    }

    fn labels(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}
