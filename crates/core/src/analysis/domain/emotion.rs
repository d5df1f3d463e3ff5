use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::region::Region;

/// The closed set of expressions the classifier can assign to a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Surprise,
    Angry,
}

impl EmotionLabel {
    /// Every label, in counter order.
    pub const ALL: [EmotionLabel; 5] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Angry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Surprise => "Surprise",
            EmotionLabel::Angry => "Angry",
        }
    }

    /// Box and label color, RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            EmotionLabel::Happy => [0, 255, 0],
            EmotionLabel::Sad => [0, 0, 255],
            EmotionLabel::Angry => [255, 0, 0],
            EmotionLabel::Surprise => [0, 255, 255],
            EmotionLabel::Neutral => [128, 128, 128],
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            EmotionLabel::Neutral => 0,
            EmotionLabel::Happy => 1,
            EmotionLabel::Sad => 2,
            EmotionLabel::Surprise => 3,
            EmotionLabel::Angry => 4,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label with its confidence percentage in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub label: EmotionLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: EmotionLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// Text drawn next to the face box, e.g. `Happy (85%)`.
    pub fn caption(&self) -> String {
        format!("{} ({:.0}%)", self.label, self.confidence)
    }
}

/// Classification of one detected face, in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionResult {
    pub region: Region,
    pub emotion: EmotionLabel,
    pub confidence: f64,
}

impl DetectionResult {
    pub fn new(region: Region, classification: Classification) -> Self {
        Self {
            region,
            emotion: classification.label,
            confidence: classification.confidence,
        }
    }

    pub fn classification(&self) -> Classification {
        Classification::new(self.emotion, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EmotionLabel::Happy, [0, 255, 0])]
    #[case(EmotionLabel::Sad, [0, 0, 255])]
    #[case(EmotionLabel::Angry, [255, 0, 0])]
    #[case(EmotionLabel::Surprise, [0, 255, 255])]
    #[case(EmotionLabel::Neutral, [128, 128, 128])]
    fn test_colors(#[case] label: EmotionLabel, #[case] rgb: [u8; 3]) {
        assert_eq!(label.color(), rgb);
    }

    #[test]
    fn test_indices_follow_all_order() {
        for (i, label) in EmotionLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn test_caption_rounds_confidence() {
        let c = Classification::new(EmotionLabel::Surprise, 67.5);
        assert_eq!(c.caption(), "Surprise (68%)");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Classification::new(EmotionLabel::Angry, 140.0).confidence, 100.0);
        assert_eq!(Classification::new(EmotionLabel::Sad, -3.0).confidence, 0.0);
    }
}
