use std::sync::Mutex;

use serde::Serialize;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counter snapshot served by the bridge's metrics endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub processed: usize,
    pub errors: usize,
    pub degenerate: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn record_degenerate(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.degenerate += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_outcomes() {
        let recorder = MetricsRecorder::new();
        recorder.record_processed();
        recorder.record_processed();
        recorder.record_error();
        recorder.record_degenerate();

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.degenerate, 1);
    }
}
