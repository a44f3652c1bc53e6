//! Observer recording every notification for later assertions.

use std::sync::Mutex;

use crate::driver::BatchReport;
use crate::observer::ConversionObserver;

/// A notification received by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    RunningChanged(Vec<String>),
    ProgressTick,
    ConvertedCount(usize),
    BatchFinished { converted: usize, failed: usize },
}

/// Observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// All events in the order they arrived.
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Largest running set ever reported.
    pub fn max_running(&self) -> usize {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::RunningChanged(running) => Some(running.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Last resolved count reported.
    pub fn last_count(&self) -> Option<usize> {
        self.events().iter().rev().find_map(|e| match e {
            ObservedEvent::ConvertedCount(n) => Some(*n),
            _ => None,
        })
    }

    pub fn ticks(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::ProgressTick))
    }

    pub fn batches_finished(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::BatchFinished { .. }))
    }

    fn count(&self, pred: impl Fn(&ObservedEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl ConversionObserver for RecordingObserver {
    fn on_running_changed(&self, running: &[String]) {
        self.push(ObservedEvent::RunningChanged(running.to_vec()));
    }

    fn on_progress_tick(&self) {
        self.push(ObservedEvent::ProgressTick);
    }

    fn on_converted_count(&self, resolved: usize) {
        self.push(ObservedEvent::ConvertedCount(resolved));
    }

    fn on_batch_finished(&self, report: &BatchReport) {
        self.push(ObservedEvent::BatchFinished {
            converted: report.converted.len(),
            failed: report.failed.len(),
        });
    }
}
