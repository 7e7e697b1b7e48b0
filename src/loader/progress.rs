//! Load progress reporting

/// Receives the fraction of a file consumed so far, in `[0, 1]`
pub trait ProgressSink {
    fn report(&mut self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: FnMut(f64),
{
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Sink that discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// Turns byte counts into a clamped, non-decreasing fraction
pub(crate) struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    total_bytes: u64,
    last: f64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink, total_bytes: u64) -> Self {
        Self {
            sink,
            total_bytes,
            last: 0.0,
        }
    }

    pub(crate) fn update(&mut self, bytes_consumed: u64) {
        let fraction = if self.total_bytes == 0 {
            1.0
        } else {
            (bytes_consumed as f64 / self.total_bytes as f64).min(1.0)
        };
        self.last = self.last.max(fraction);
        self.sink.report(self.last);
    }

    pub(crate) fn finish(&mut self) {
        self.last = 1.0;
        self.sink.report(1.0);
    }
}
