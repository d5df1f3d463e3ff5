use std::fmt::Write;

use crate::analysis::domain::emotion_counter::EmotionCounts;

/// Category names the stored-label report is tallied over.
///
/// These do not line up with [`EmotionLabel`](crate::analysis::domain::emotion::EmotionLabel):
/// only `Surprise` and `Neutral` are spelled the same, so labels such as
/// `Happy` land in [`FrequencyReport::unrecognized`].
pub const REPORT_CATEGORIES: [&str; 7] = [
    "Anger",
    "Disgust",
    "Fear",
    "Happiness",
    "Sadness",
    "Surprise",
    "Neutral",
];

const BAR_WIDTH: usize = 40;

/// Frequency of stored labels over [`REPORT_CATEGORIES`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyReport {
    counts: [u64; 7],
    unrecognized: u64,
}

impl FrequencyReport {
    /// Tallies exact, case-sensitive matches.
    pub fn tally<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut report = Self::default();
        for label in labels {
            let label = label.as_ref();
            match REPORT_CATEGORIES.iter().position(|c| *c == label) {
                Some(i) => report.counts[i] += 1,
                None => report.unrecognized += 1,
            }
        }
        if report.unrecognized > 0 {
            log::warn!(
                "{} stored label(s) match no report category",
                report.unrecognized
            );
        }
        report
    }

    pub fn count(&self, category: &str) -> Option<u64> {
        REPORT_CATEGORIES
            .iter()
            .position(|c| *c == category)
            .map(|i| self.counts[i])
    }

    pub fn unrecognized(&self) -> u64 {
        self.unrecognized
    }

    pub fn render(&self) -> String {
        let rows: Vec<(&str, u64)> = REPORT_CATEGORIES
            .iter()
            .copied()
            .zip(self.counts.iter().copied())
            .collect();
        let mut out = render_bars("Emotion frequency", &rows);
        if self.unrecognized > 0 {
            let _ = writeln!(out, "({} unrecognized)", self.unrecognized);
        }
        out
    }
}

/// Bar chart of the in-process counter.
pub struct CountsChart<'a>(pub &'a EmotionCounts);

impl CountsChart<'_> {
    pub fn render(&self) -> String {
        let rows: Vec<(&str, u64)> = self.0.iter().map(|(l, n)| (l.as_str(), n)).collect();
        render_bars("Emotion statistics", &rows)
    }
}

fn render_bars(title: &str, rows: &[(&str, u64)]) -> String {
    let max = rows.iter().map(|&(_, n)| n).max().unwrap_or(0);
    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = format!("{title}\n");
    for &(name, n) in rows {
        let bar = if max == 0 {
            0
        } else {
            ((n as f64 / max as f64) * BAR_WIDTH as f64).round() as usize
        };
        let _ = writeln!(out, "{name:<name_width$} | {} {n}", "#".repeat(bar));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::emotion::EmotionLabel;
    use crate::analysis::domain::emotion_counter::EmotionCounter;

    #[test]
    fn test_tally_exact_matches() {
        let report = FrequencyReport::tally(&["Surprise", "Neutral", "Neutral", "Fear"]);
        assert_eq!(report.count("Neutral"), Some(2));
        assert_eq!(report.count("Surprise"), Some(1));
        assert_eq!(report.count("Fear"), Some(1));
        assert_eq!(report.count("Anger"), Some(0));
        assert_eq!(report.unrecognized(), 0);
    }

    #[test]
    fn test_detector_labels_outside_categories_are_unrecognized() {
        let labels: Vec<&str> = EmotionLabel::ALL.iter().map(|l| l.as_str()).collect();
        let report = FrequencyReport::tally(&labels);
        // Happy, Sad and Angry have no matching category.
        assert_eq!(report.unrecognized(), 3);
        assert_eq!(report.count("Happiness"), Some(0));
    }

    #[test]
    fn test_unknown_category_has_no_count() {
        assert_eq!(FrequencyReport::default().count("Happy"), None);
    }

    #[test]
    fn test_render_lists_all_categories() {
        let report = FrequencyReport::tally(&["Neutral", "Neutral", "Surprise", "Happy"]);
        let text = report.render();
        for c in REPORT_CATEGORIES {
            assert!(text.contains(c), "{c} missing in\n{text}");
        }
        assert!(text.contains(&format!("{} 2", "#".repeat(BAR_WIDTH))));
        assert!(text.contains("(1 unrecognized)"));
    }

    #[test]
    fn test_counts_chart() {
        let counter = EmotionCounter::new();
        counter.increment(EmotionLabel::Happy);
        let text = CountsChart(&counter.snapshot()).render();
        assert!(text.starts_with("Emotion statistics\n"));
        assert!(text.contains("Happy    | ######################################## 1"));
        assert!(text.contains("Sad      |  0"));
    }
}
