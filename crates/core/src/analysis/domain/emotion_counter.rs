use std::sync::{Mutex, MutexGuard};

use super::emotion::EmotionLabel;

/// Per-label tally, in [`EmotionLabel::ALL`] order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmotionCounts([u64; 5]);

impl EmotionCounts {
    pub fn get(&self, label: EmotionLabel) -> u64 {
        self.0[label.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, u64)> + '_ {
        EmotionLabel::ALL.iter().map(move |&l| (l, self.get(l)))
    }
}

/// Running count of classified faces, shared between the detector and
/// whoever displays statistics.
#[derive(Debug, Default)]
pub struct EmotionCounter {
    counts: Mutex<EmotionCounts>,
}

impl EmotionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, label: EmotionLabel) {
        self.lock().0[label.index()] += 1;
    }

    pub fn snapshot(&self) -> EmotionCounts {
        *self.lock()
    }

    pub fn reset(&self) {
        *self.lock() = EmotionCounts::default();
    }

    // A panic while holding the lock cannot leave the array half-written.
    fn lock(&self) -> MutexGuard<'_, EmotionCounts> {
        self.counts.lock().unwrap_or_else(|e| e.into_inner())
    }
}
