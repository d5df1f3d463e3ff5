use crate::analysis::domain::emotion::EmotionLabel;

/// Domain interface for persisting classified labels.
///
/// Rows are append-only: one row per classified face.
pub trait EmotionStore: Send {
    fn record(&mut self, emotion: EmotionLabel) -> Result<(), Box<dyn std::error::Error>>;

    /// Every stored label, oldest first, exactly as written.
    fn labels(&self) -> Result<Vec<String>, Box<dyn std::error::Error>>;
}
