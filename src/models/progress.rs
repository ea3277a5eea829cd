use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Scanning,
    Processing,
    Analyzing,
    Applying,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub stage: ProgressStage,
    pub current: usize,
    pub total: usize,
    pub current_item: String,
    pub percentage: usize,
}

impl Progress {
    pub fn new(stage: ProgressStage, current: usize, total: usize, item: &str) -> Self {
        Self {
            stage,
            current,
            total,
            current_item: item.to_string(),
            percentage: phase_percent(current, total),
        }
    }
}

pub fn phase_percent(processed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0)
        .round()
        .clamp(0.0, 100.0) as usize
}

/// Forwards every `every`-th item (plus the first and last) to `sink`.
pub struct ProgressReporter<'a> {
    sink: Box<dyn FnMut(Progress) + Send + 'a>,
    every: usize,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(every: usize, sink: impl FnMut(Progress) + Send + 'a) -> Self {
        Self {
            sink: Box::new(sink),
            every: every.max(1),
        }
    }

    pub fn silent() -> Self {
        Self::new(usize::MAX, |_| {})
    }

    /// `current` is 1-based.
    pub fn item(&mut self, stage: ProgressStage, current: usize, total: usize, item: &str) {
        let first = current == 1;
        let last = current == total;
        if first || last || current % self.every == 0 {
            (self.sink)(Progress::new(stage, current, total, item));
        }
    }

    pub fn stage(&mut self, stage: ProgressStage, current: usize, total: usize) {
        (self.sink)(Progress::new(stage, current, total, ""));
    }
}
