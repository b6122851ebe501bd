//! For tracking compositing progress and aborting early

/// A trait that is used to report progress to some consumer.
pub trait ProgressReporter {
    /// Called after each background frame has been processed (successfully or not).
    ///
    /// This method may return `false` to abort processing.
    fn increase(&mut self) -> bool;

    /// Called once the animation has been written
    fn done(&mut self, _msg: &str) {}
}

/// No-op progress reporter
pub struct NoProgress {}

impl ProgressReporter for NoProgress {
    fn increase(&mut self) -> bool {
        true
    }
}

/// Gives up after the given number of frames. Handy for tests.
pub struct StopAfter(pub usize);

impl ProgressReporter for StopAfter {
    fn increase(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}
