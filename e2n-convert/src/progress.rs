//! Conversion progress reporting.

/// Trait for receiving conversion progress updates.
pub trait ConvertProgress {
    /// Called when a pipeline stage starts (e.g., "Deduplicating services").
    fn on_stage(&self, message: &str);

    /// Called after each output group folder is written.
    fn on_group(&self, current: usize, total: usize, name: &str);

    /// Called when the conversion is complete.
    fn on_complete(&self, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl ConvertProgress for SilentProgress {
    fn on_stage(&self, _message: &str) {}
    fn on_group(&self, _current: usize, _total: usize, _name: &str) {}
    fn on_complete(&self, _message: &str) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl ConvertProgress for LogProgress {
    fn on_stage(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_group(&self, current: usize, total: usize, name: &str) {
        log::debug!("  [{}/{}] {}", current, total, name);
    }

    fn on_complete(&self, message: &str) {
        log::info!("{}", message);
    }
}
