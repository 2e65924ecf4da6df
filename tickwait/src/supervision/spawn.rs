//! Worker process creation and ownership
//!
//! A [`ProcessHandle`] owns its child until the child is reaped. A handle that
//! is dropped unreaped kills and reaps its child, so a failure anywhere
//! between fork and the final wait never leaves a stray worker behind.

#![allow(unsafe_code)] // fork() and _exit() require unsafe

use log::{debug, info};
use nix::sys::prctl::set_pdeathsig;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{fork, getpid, getppid, ForkResult, Pid};

use super::wait::{wait_once, WaitOutcome};
use super::worker::Worker;
use crate::domain::{ExitStatus, SupervisorError};
use crate::process_lookup::read_stat;

/// Exit code of a worker whose supervisor died before it could start
pub const EXIT_ORPHANED: i32 = 125;

/// Starts a worker as an independently scheduled child process
pub trait Launcher {
    /// # Errors
    /// Returns [`SupervisorError::SpawnFailed`] if the child can't be created.
    fn launch(&self, worker: &Worker) -> Result<ProcessHandle, SupervisorError>;
}

/// Launches workers with `fork(2)`
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkLauncher;

impl Launcher for ForkLauncher {
    fn launch(&self, worker: &Worker) -> Result<ProcessHandle, SupervisorError> {
        let parent = getpid();

        // SAFETY: the child only calls async-signal-safe functions before _exit
        match unsafe { fork() } {
            Ok(ForkResult::Child) => enter_worker(worker, parent),
            Ok(ForkResult::Parent { child }) => Ok(ProcessHandle::new(child)),
            Err(e) => Err(SupervisorError::SpawnFailed(e)),
        }
    }
}

fn enter_worker(worker: &Worker, parent: Pid) -> ! {
    // The death signal is cleared by fork, so the child requests it itself.
    // A changed parent means the supervisor already died.
    if set_pdeathsig(Signal::SIGKILL).is_err() || getppid() != parent {
        // SAFETY: _exit skips atexit handlers and stdio flushing inherited from the parent
        unsafe { libc::_exit(EXIT_ORPHANED) }
    }
    worker.run();
    // SAFETY: as above
    unsafe { libc::_exit(i32::from(worker.exit_code())) }
}

/// Exclusive owner of a spawned worker's pid
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Pid,
    reaped: bool,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid) -> Self {
        Self { pid, reaped: false }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_reaped(&self) -> bool {
        self.reaped
    }

    pub(crate) fn mark_reaped(&mut self) {
        self.reaped = true;
    }

    /// Kill the worker with `SIGKILL` and reap it.
    ///
    /// Returns the reaped status, or `None` if the worker was already reaped
    /// or could not be collected.
    pub fn terminate(&mut self) -> Option<ExitStatus> {
        if self.reaped {
            return None;
        }

        match read_stat(self.pid) {
            Ok(stat) => debug!("Killing worker {} ({}) in state {}", self.pid, stat.comm, stat.state),
            Err(_) => debug!("Killing worker {}", self.pid),
        }
        if let Err(e) = kill(self.pid, Signal::SIGKILL) {
            info!("Failed to kill {}: {e}", self.pid);
        }

        // Whatever happens below, this pid is no longer ours to wait on
        self.reaped = true;
        loop {
            match wait_once(self.pid) {
                WaitOutcome::Interrupted => {}
                WaitOutcome::Completed(reaped) => return Some(reaped.status),
                WaitOutcome::Failed(errno) => {
                    info!("Failed to reap {}: {errno}", self.pid);
                    return None;
                }
            }
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.reaped {
            self.terminate();
        }
    }
}
