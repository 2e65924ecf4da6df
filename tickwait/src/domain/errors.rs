//! Structured error types for tickwait
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! An interrupted wait is deliberately absent: it is a normal outcome of
//! [`crate::supervision::wait_once`], not an error.

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(#[source] Errno),

    #[error("Failed to arm periodic timer: {0}")]
    TimerArmFailed(#[source] Errno),

    #[error("A periodic timer is already armed in this process")]
    TimerBusy,

    #[error("Timer interval must be greater than zero")]
    ZeroInterval,

    #[error("Waiting for worker {pid} failed: {errno}")]
    WaitFailed { pid: Pid, errno: Errno },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_failed_display() {
        let err = SupervisorError::WaitFailed { pid: Pid::from_raw(1234), errno: Errno::ECHILD };
        let msg = err.to_string();
        assert!(msg.contains("1234"));
        assert!(msg.contains("ECHILD"));
    }

    #[test]
    fn test_spawn_failed_keeps_source() {
        let err = SupervisorError::SpawnFailed(Errno::EAGAIN);
        assert!(err.to_string().starts_with("Failed to spawn worker"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source, Some(Errno::EAGAIN.to_string()));
    }
}
