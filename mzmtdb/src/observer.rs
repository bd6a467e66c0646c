use crate::AlignmentResult;

/// Receives notifications from a running [`Processor`](crate::Processor) and can cancel it.
/// All methods have a default no-op implementation, `()` is the observer that ignores everything.
pub trait ProcessObserver {
    /// Called once for every dataset that finished a step
    fn progress(&mut self, _current: usize, _total: usize, _status: &str) {}

    /// Called exactly once per successful run, after all datasets are aligned
    fn alignment_complete(&mut self, _results: &[AlignmentResult]) {}

    /// Polled between datasets, returning true stops the run with a
    /// [`Cancelled`](crate::MtdbError::Cancelled) error
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl ProcessObserver for () {}

/// An observer that records all notifications, useful to inspect a run afterwards
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    /// All progress notifications as `(current, total, status)`
    pub progress: Vec<(usize, usize, String)>,
    /// The results of every alignment complete notification
    pub alignments: Vec<Vec<AlignmentResult>>,
    /// Cancel the run once this many progress notifications are received
    pub cancel_after: Option<usize>,
}

impl ProcessObserver for RecordingObserver {
    fn progress(&mut self, current: usize, total: usize, status: &str) {
        self.progress.push((current, total, status.to_string()));
    }

    fn alignment_complete(&mut self, results: &[AlignmentResult]) {
        self.alignments.push(results.to_vec());
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.progress.len() >= limit)
    }
}
