use std::sync::{Arc, Mutex};

use likelihood::{AnalysisOutcome, ProgressListener, Side};

/// Listener recording every callback as a line, for ordering assertions.
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("event log poisoned").clone()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

impl ProgressListener for RecordingListener {
    fn analysis_started(&self) {
        self.push(String::from("started"));
    }

    fn locus_started(&self, side: Side, locus: &str, _estimated_size: usize) {
        self.push(format!("locus-started {side} {locus}"));
    }

    fn locus_finished(&self, side: Side, locus: &str, _probability: f64) {
        self.push(format!("locus-finished {side} {locus}"));
    }

    fn analysis_finished(&self, outcome: &AnalysisOutcome) {
        let tag = match outcome {
            AnalysisOutcome::Completed(_) => "completed",
            AnalysisOutcome::Failed(_)    => "failed",
            AnalysisOutcome::Cancelled    => "cancelled",
        };
        self.push(format!("finished {tag}"));
    }
}
