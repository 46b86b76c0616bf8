//! Shared log capture for tests asserting on `bleframe` diagnostics.
//!
//! `bleframe` emits `tracing` events with the `log-always` bridge enabled, so
//! every event is also visible to a [`logtest::Logger`]. The logger is
//! process-global; tests using it should run under `#[serial]`.

use std::sync::{Mutex, MutexGuard, OnceLock};

use log::Level;
use logtest::Logger;
use rstest::fixture;

/// Exclusive handle to the process-wide [`Logger`].
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the global logger, starting it on first use.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder panicked while holding the logger.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger.lock().expect("logger poisoned");

        Self { guard }
    }

    /// Drop every record captured so far.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Pop records until one at `level` contains `needle`.
    ///
    /// Returns the matching message text, or `None` once the capture is
    /// exhausted.
    pub fn find(&mut self, level: Level, needle: &str) -> Option<String> {
        while let Some(record) = self.guard.pop() {
            if matches(&record, level, needle) {
                return Some(record.args().to_string());
            }
        }
        None
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

fn matches(record: &logtest::Record, level: Level, needle: &str) -> bool {
    record.level() == level && record.args().to_string().contains(needle)
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }

