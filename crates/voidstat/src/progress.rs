//! The progress-reporting collaborator.
//!
//! Reporting is observational only: a reporter sees how far along a
//! driver is but can never influence the result. Rendering (a terminal
//! bar, a GUI, a log line every n%) is the caller's business; the
//! drivers just emit the ticks, and only when the verbose option is on.

/// Receives progress ticks from a driver.
pub trait Progress {
    /// called once before the loop starts, with the number of units of
    /// work the driver will complete
    fn start(&mut self, total: u64);

    /// called after each completed unit, with the running total
    fn advance(&mut self, done: u64);

    /// called once after the loop completes normally (not on error or
    /// interruption)
    fn finish(&mut self);
}

/// The do-nothing reporter, for callers that don't care.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn start(&mut self, _total: u64) {}

    fn advance(&mut self, _done: u64) {}

    fn finish(&mut self) {}
}
