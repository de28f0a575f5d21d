//! Progress reporting and cooperative cancellation.

use crate::core::ImportError;

/// Receives coarse progress updates during a load and may ask it to stop.
pub trait ProgressReporter {
    /// Describe the current phase.
    fn report(&mut self, message: &str);

    /// Overall completion in `0.0..=1.0`.
    fn set_progress(&mut self, fraction: f64);

    /// `false` aborts the load at the next checkpoint.
    fn keep_going(&self) -> bool;
}

/// Reporter that ignores updates and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn report(&mut self, _message: &str) {}

    fn set_progress(&mut self, _fraction: f64) {}

    fn keep_going(&self) -> bool {
        true
    }
}

/// Counts processed entries and consults the reporter every `interval`.
pub(crate) struct Checkpoint<'a> {
    reporter: Option<&'a mut dyn ProgressReporter>,
    interval: usize,
    total: usize,
    done: usize,
}

impl<'a> Checkpoint<'a> {
    pub(crate) fn new(reporter: Option<&'a mut dyn ProgressReporter>, interval: usize, total: usize) -> Self {
        Self {
            reporter,
            interval: interval.max(1),
            total,
            done: 0,
        }
    }

    pub(crate) fn set_total(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    pub(crate) fn report(&mut self, message: &str) {
        if let Some(reporter) = self.reporter.as_deref_mut() {
            reporter.report(message);
        }
    }

    /// Count one entry; at interval boundaries push progress and honour a
    /// cancellation request.
    pub(crate) fn tick(&mut self) -> Result<(), ImportError> {
        self.done += 1;
        if self.done % self.interval != 0 {
            return Ok(());
        }
        let Some(reporter) = self.reporter.as_deref_mut() else {
            return Ok(());
        };
        if self.total > 0 {
            reporter.set_progress((self.done as f64 / self.total as f64).min(1.0));
        }
        if reporter.keep_going() {
            Ok(())
        } else {
            Err(ImportError::Cancelled)
        }
    }

    /// Check for cancellation regardless of the interval.
    pub(crate) fn check(&mut self) -> Result<(), ImportError> {
        match self.reporter.as_deref() {
            Some(reporter) if !reporter.keep_going() => Err(ImportError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        fractions: Vec<f64>,
        stop_after: Option<usize>,
    }

    impl ProgressReporter for Recorder {
        fn report(&mut self, _message: &str) {}

        fn set_progress(&mut self, fraction: f64) {
            self.fractions.push(fraction);
        }

        fn keep_going(&self) -> bool {
            self.stop_after.map_or(true, |n| self.fractions.len() < n)
        }
    }

    #[test]
    fn test_ticks_report_every_interval() {
        let mut rec = Recorder::default();
        {
            let mut cp = Checkpoint::new(Some(&mut rec), 2, 4);
            for _ in 0..4 {
                cp.tick().unwrap();
            }
        }
        assert_eq!(rec.fractions, vec![0.5, 1.0]);
    }

    #[test]
    fn test_cancel_at_checkpoint() {
        let mut rec = Recorder {
            stop_after: Some(1),
            ..Default::default()
        };
        let mut cp = Checkpoint::new(Some(&mut rec), 1, 10);
        let err = cp.tick().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_no_reporter_never_cancels() {
        let mut cp = Checkpoint::new(None, 1, 0);
        for _ in 0..10 {
            cp.tick().unwrap();
        }
        assert!(cp.check().is_ok());
    }

    #[test]
    fn test_null_progress_keeps_going() {
        assert!(NullProgress.keep_going());
    }
}
