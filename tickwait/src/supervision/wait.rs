//! Interruptible wait for a single child process.

#![allow(unsafe_code)] // wait4() requires unsafe

use nix::errno::Errno;
use nix::unistd::Pid;
use std::mem::MaybeUninit;

use crate::domain::{ExitStatus, ResourceUsage};

/// Final state of a child collected by `wait4`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub status: ExitStatus,
    pub usage: ResourceUsage,
}

/// Result of one blocking wait attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The child terminated and has been reaped
    Completed(Reaped),
    /// A signal handler ran before the child terminated; the child is untouched
    Interrupted,
    /// Any other failure (e.g. `ECHILD`)
    Failed(Errno),
}

/// Block until `pid` terminates or a signal interrupts the wait.
///
/// Never retries on its own: an interruption is reported as
/// [`WaitOutcome::Interrupted`] so the caller decides what to do with it.
pub fn wait_once(pid: Pid) -> WaitOutcome {
    let mut status: libc::c_int = 0;
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();

    // SAFETY: both out-pointers refer to live, writable locals
    let res = unsafe { libc::wait4(pid.as_raw(), &mut status, 0, usage.as_mut_ptr()) };
    if res < 0 {
        return match Errno::last() {
            Errno::EINTR => WaitOutcome::Interrupted,
            errno => WaitOutcome::Failed(errno),
        };
    }

    // SAFETY: rusage is plain old data, valid when zeroed and filled by wait4
    let usage = unsafe { usage.assume_init() };
    WaitOutcome::Completed(Reaped {
        status: ExitStatus::from_raw(status),
        usage: ResourceUsage::from_rusage(&usage),
    })
}
