use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for session-level events: progress, per-stage timings, metrics
/// and frames that had to be skipped.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// How long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame value such as the number of faces found.
    fn metric(&mut self, name: &str, value: f64);

    /// A frame that could not be read or processed.
    fn skipped(&mut self, frame_index: usize, reason: &str);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards everything. Used for single images and in tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn skipped(&mut self, _frame_index: usize, _reason: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// Logs progress through `log` every `throttle_frames` frames and keeps
/// enough history to print an end-of-session summary.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    skipped: Vec<usize>,
    start_time: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            skipped: Vec::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.skipped.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Session summary ({frames} frames, {:.1}s):",
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        for (name, values) in &self.metrics {
            let total: f64 = values.iter().sum();
            let avg = total / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.1}, total {total:.0}"));
        }

        if !self.skipped.is_empty() {
            lines.push(format!("  Skipped: {} frame(s)", self.skipped.len()));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(Vec::as_slice)
    }

    pub fn skipped_frames(&self) -> &[usize] {
        &self.skipped
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn skipped(&mut self, frame_index: usize, reason: &str) {
        log::warn!("Skipping frame {frame_index}: {reason}");
        self.skipped.push(frame_index);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
