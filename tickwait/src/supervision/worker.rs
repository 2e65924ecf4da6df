//! The supervised worker: a task with a bounded, self-terminating lifetime.

use std::time::Duration;

/// Lifetime used when none is configured
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    lifetime: Duration,
    exit_code: u8,
}

impl Worker {
    pub fn new(lifetime: Duration) -> Self {
        Self { lifetime, exit_code: 0 }
    }

    #[must_use]
    pub fn with_exit_code(mut self, exit_code: u8) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Sleep for the configured lifetime.
    ///
    /// The process hosting the worker exits with [`Worker::exit_code`] once
    /// this returns.
    pub fn run(&self) {
        if !self.lifetime.is_zero() {
            std::thread::sleep(self.lifetime);
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME)
    }
}
