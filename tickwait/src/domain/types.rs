//! Core value types shared by the supervisor, the CLI and the report exporter.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::errors::SupervisorError;

/// Interval used when none is configured
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Cadence of the periodic heartbeat timer.
///
/// Always non-zero; a zero interval would disarm the kernel timer instead of
/// arming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    interval: Duration,
}

impl TimerConfig {
    /// # Errors
    /// Returns [`SupervisorError::ZeroInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SupervisorError> {
        if interval.is_zero() {
            return Err(SupervisorError::ZeroInterval);
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of whole intervals that elapse within `lifetime`.
    ///
    /// This is how many times a wait spanning `lifetime` is expected to be
    /// interrupted, give or take one for scheduling jitter.
    pub fn ticks_within(&self, lifetime: Duration) -> u64 {
        u64::try_from(lifetime.as_nanos() / self.interval.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_INTERVAL }
    }
}

/// How a reaped process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Exited { code: i32 },
    Signaled { signal: i32, core_dumped: bool },
    Other,
}

/// Wait status of a reaped worker.
///
/// Displays as the raw status word, which is what the `Stopped with` line
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitStatus {
    raw: i32,
    #[serde(flatten)]
    termination: Termination,
}

impl ExitStatus {
    pub fn from_raw(raw: i32) -> Self {
        let termination = if libc::WIFEXITED(raw) {
            Termination::Exited { code: libc::WEXITSTATUS(raw) }
        } else if libc::WIFSIGNALED(raw) {
            Termination::Signaled { signal: libc::WTERMSIG(raw), core_dumped: libc::WCOREDUMP(raw) }
        } else {
            Termination::Other
        };
        Self { raw, termination }
    }

    pub fn raw(&self) -> i32 {
        self.raw
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn success(&self) -> bool {
        self.termination == Termination::Exited { code: 0 }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// CPU and memory usage of a reaped worker, from `wait4`'s `rusage`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub user_time_us: u64,
    pub system_time_us: u64,
    pub max_rss_kib: u64,
}

impl ResourceUsage {
    pub fn from_rusage(usage: &libc::rusage) -> Self {
        fn micros(tv: libc::timeval) -> u64 {
            let secs = u64::try_from(tv.tv_sec).unwrap_or(0);
            let usecs = u64::try_from(tv.tv_usec).unwrap_or(0);
            secs.saturating_mul(1_000_000).saturating_add(usecs)
        }
        Self {
            user_time_us: micros(usage.ru_utime),
            system_time_us: micros(usage.ru_stime),
            // Linux reports ru_maxrss in kilobytes
            max_rss_kib: u64::try_from(usage.ru_maxrss).unwrap_or(0),
        }
    }
}

/// Outcome of one complete supervision run
#[derive(Debug, Clone, Serialize)]
pub struct SupervisionReport {
    pub pid: i32,
    pub status: ExitStatus,
    pub usage: ResourceUsage,
    /// Waits that returned early because the timer fired
    pub interruptions: u64,
    /// Timer firings dispatched to the heartbeat callback
    pub heartbeats: u64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(TimerConfig::new(Duration::ZERO), Err(SupervisorError::ZeroInterval)));
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(TimerConfig::default().interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_ticks_within() {
        let config = TimerConfig::default();
        assert_eq!(config.ticks_within(Duration::from_secs(3)), 6);
        assert_eq!(config.ticks_within(Duration::from_millis(499)), 0);
        assert_eq!(config.ticks_within(Duration::from_millis(1250)), 2);
    }

    #[test]
    fn test_exit_status_exited() {
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(status.termination(), Termination::Exited { code: 3 });
        assert_eq!(status.to_string(), "768");
        assert!(!status.success());
        assert!(ExitStatus::from_raw(0).success());
    }

    #[test]
    fn test_exit_status_signaled() {
        assert_eq!(
            ExitStatus::from_raw(libc::SIGKILL).termination(),
            Termination::Signaled { signal: libc::SIGKILL, core_dumped: false }
        );
        assert_eq!(
            ExitStatus::from_raw(0x80 | libc::SIGSEGV).termination(),
            Termination::Signaled { signal: libc::SIGSEGV, core_dumped: true }
        );
    }

    #[test]
    fn test_exit_status_json() {
        let json = serde_json::to_value(ExitStatus::from_raw(0)).unwrap();
        assert_eq!(json["raw"], 0);
        assert_eq!(json["kind"], "exited");
        assert_eq!(json["code"], 0);
    }
}
