use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Rows processed between two progress reports / cancellation polls.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives progress of a long scan (listing or export).
pub trait ProgressSink {
    /// `total` is known for object scans (the row count) and unknown for
    /// ad-hoc queries.
    fn update(&mut self, processed: u64, total: Option<u64>);

    fn finish(&mut self) {}
}

/// Progress sink that discards every report.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _processed: u64, _total: Option<u64>) {}
}

/// Cancellation token, progress sink and polling interval of one scan.
pub struct ScanContext<'a> {
    pub cancel: &'a CancelToken,
    pub progress: &'a mut dyn ProgressSink,
    pub interval: u64,
}

impl<'a> ScanContext<'a> {
    pub fn new(cancel: &'a CancelToken, progress: &'a mut dyn ProgressSink) -> Self {
        Self {
            cancel,
            progress,
            interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Called after `processed` rows have been fully handled. On interval
    /// boundaries reports progress and returns `true` if the scan must stop.
    pub fn tick(&mut self, processed: u64, total: Option<u64>) -> bool {
        if self.interval == 0 || processed % self.interval != 0 {
            return false;
        }

        self.progress.update(processed, total);
        self.cancel.is_cancelled()
    }

    pub fn finish(&mut self) {
        self.progress.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        updates: Vec<u64>,
    }

    impl ProgressSink for Recorder {
        fn update(&mut self, processed: u64, _total: Option<u64>) {
            self.updates.push(processed);
        }
    }

    #[test]
    fn tick_reports_only_on_interval_boundaries() {
        let cancel = CancelToken::new();
        let mut recorder = Recorder::default();
        let mut ctx = ScanContext::new(&cancel, &mut recorder).with_interval(3);

        for processed in 1..=7 {
            assert!(!ctx.tick(processed, None));
        }

        assert_eq!(recorder.updates, vec![3, 6]);
    }

    #[test]
    fn cancellation_is_seen_at_next_boundary() {
        let cancel = CancelToken::new();
        let mut progress = NoProgress;
        let mut ctx = ScanContext::new(&cancel, &mut progress).with_interval(2);

        cancel.cancel();

        assert!(!ctx.tick(1, None));
        assert!(ctx.tick(2, None));
    }

    #[test]
    fn cloned_token_shares_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
