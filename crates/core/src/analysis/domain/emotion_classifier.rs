use crate::shared::region::Region;

use super::edges::EdgeThresholds;
use super::emotion::{Classification, EmotionLabel};
use super::face_bands::FaceBands;
use super::facial_features::{
    edge_intensity, eye_height_ratio, mean_intensity, mouth_curve, std_intensity,
};

/// Scalar statistics of one face that the decision rules read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceMeasurements {
    pub mean: f64,
    pub std: f64,
    pub edge: f64,
    /// Mean of the bottom half of the lower band.
    pub cheek: f64,
    /// Mean of the top half of the upper band; `None` when that half is
    /// empty, which keeps the Angry rule from firing.
    pub brow: Option<f64>,
    pub mouth_curve: f64,
    pub eye_count: usize,
    pub eye_ratio: f64,
    pub smile_count: usize,
    pub max_smile_area: i64,
}

impl FaceMeasurements {
    pub fn measure(
        bands: &FaceBands<'_>,
        eyes: &[Region],
        smiles: &[Region],
        thresholds: EdgeThresholds,
    ) -> Self {
        Self {
            mean: mean_intensity(bands.face),
            std: std_intensity(bands.face),
            edge: edge_intensity(bands.face, thresholds),
            cheek: mean_intensity(bands.cheeks()),
            brow: Some(bands.brows())
                .filter(|b| !b.is_empty())
                .map(mean_intensity),
            mouth_curve: mouth_curve(bands.lower, thresholds),
            eye_count: eyes.len(),
            eye_ratio: eye_height_ratio(eyes),
            smile_count: smiles.len(),
            max_smile_area: smiles.iter().map(Region::area).max().unwrap_or(0),
        }
    }
}

/// Rule-based expression classifier.
///
/// The rules run in a fixed order and the first one that fires decides:
/// Happy, Surprise, Sad, Angry, then Neutral as the fallback. A later rule
/// never overrides an earlier one, whatever its confidence.
pub struct EmotionClassifier {
    thresholds: EdgeThresholds,
}

impl EmotionClassifier {
    pub fn new(thresholds: EdgeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(
        &self,
        bands: &FaceBands<'_>,
        eyes: &[Region],
        smiles: &[Region],
    ) -> (Classification, FaceMeasurements) {
        let m = FaceMeasurements::measure(bands, eyes, smiles, self.thresholds);
        (decide(&m), m)
    }
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new(EdgeThresholds::default())
    }
}

pub fn decide(m: &FaceMeasurements) -> Classification {
    let best = 0.0;

    if m.smile_count > 0 {
        let mut c = 30.0 + (m.smile_count as f64 * 10.0).min(30.0);
        if m.max_smile_area > 1000 {
            c += 20.0;
        }
        if m.cheek > m.mean {
            c += 10.0;
        }
        if m.edge > 40.0 && m.edge < 100.0 {
            c += 10.0;
        }
        return Classification::new(EmotionLabel::Happy, c.min(100.0));
    }

    if m.eye_count >= 2 && m.eye_ratio > 0.15 {
        let c = (m.eye_ratio * 300.0).min(100.0);
        if c > best {
            return Classification::new(EmotionLabel::Surprise, c);
        }
    }

    if m.eye_count >= 2 && m.mouth_curve < -10.0 {
        let c = (70.0 - m.edge * 0.5).min(100.0);
        if c > best {
            return Classification::new(EmotionLabel::Sad, c);
        }
    }

    if m.edge > 60.0 && m.brow.is_some_and(|brow| brow < m.mean) {
        let c = (m.edge * 0.8).min(100.0);
        if c > best {
            return Classification::new(EmotionLabel::Angry, c);
        }
    }

    Classification::new(EmotionLabel::Neutral, (60.0 - m.edge * 0.5).max(30.0))
}
