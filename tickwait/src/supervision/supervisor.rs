//! Worker lifecycle supervision
//!
//! Program flow of one run:
//!
//! ```text
//! spawn ──▶ arm timer ──▶ "PID: <id>"
//!                             │
//!                             ▼
//!                  ┌──▶ "Waiting" ──▶ wait_once
//!                  │                     │
//!                  └──── Interrupted ◀───┤  (dispatch ticks: "SIG")
//!                                        │
//!                   Completed / Failed ──┴──▶ "Stopped with <status>"
//! ```

use log::{debug, info, warn};
use std::io::{self, Write};
use std::time::Instant;

use super::spawn::{ForkLauncher, Launcher, ProcessHandle};
use super::timer::PeriodicTimer;
use super::wait::{wait_once, Reaped, WaitOutcome};
use super::worker::Worker;
use crate::domain::{SupervisionReport, SupervisorError, TimerConfig};
use crate::process_lookup::read_stat;

/// Everything a supervision run needs to know up front
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorConfig {
    pub timer: TimerConfig,
    pub worker: Worker,
}

/// Result of [`Supervisor::supervise`]
#[derive(Debug, Clone, Copy)]
pub struct Supervised {
    pub reaped: Reaped,
    pub interruptions: u64,
}

pub struct Supervisor<L = ForkLauncher> {
    config: SupervisorConfig,
    launcher: L,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config, launcher: ForkLauncher }
    }
}

impl<L: Launcher> Supervisor<L> {
    pub fn with_launcher(config: SupervisorConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start the worker as a child process.
    ///
    /// # Errors
    /// Returns [`SupervisorError::SpawnFailed`] if the child can't be created.
    pub fn spawn(&self) -> Result<ProcessHandle, SupervisorError> {
        let handle = self.launcher.launch(&self.config.worker)?;
        match read_stat(handle.pid()) {
            Ok(stat) => info!("Spawned worker {} ({}, state {})", handle.pid(), stat.comm, stat.state),
            Err(_) => info!("Spawned worker {}", handle.pid()),
        }
        Ok(handle)
    }

    /// Arm the heartbeat timer; `on_tick` runs once per firing.
    ///
    /// # Errors
    /// See [`PeriodicTimer::arm`].
    pub fn arm_periodic_signal<F: FnMut() -> io::Result<()>>(
        &self,
        on_tick: F,
    ) -> Result<PeriodicTimer<F>, SupervisorError> {
        PeriodicTimer::arm(self.config.timer, on_tick)
    }

    /// Wait for the worker to terminate, riding out timer interruptions.
    ///
    /// Writes `Waiting` before every attempt and exactly one
    /// `Stopped with ...` line when the loop ends. On any error the handle
    /// is dropped and the worker killed.
    ///
    /// # Errors
    /// - [`SupervisorError::WaitFailed`] for any wait failure other than an interruption
    /// - [`SupervisorError::Io`] if `out` can't be written or the heartbeat callback fails
    pub fn supervise<F: FnMut() -> io::Result<()>, W: Write>(
        &self,
        mut handle: ProcessHandle,
        timer: &mut PeriodicTimer<F>,
        out: &mut W,
    ) -> Result<Supervised, SupervisorError> {
        let pid = handle.pid();
        let mut interruptions = 0u64;

        loop {
            writeln!(out, "Waiting")?;
            match wait_once(pid) {
                WaitOutcome::Interrupted => {
                    interruptions += 1;
                    let ticks = timer.dispatch_pending()?;
                    debug!(
                        "Wait on {pid} interrupted ({ticks} ticks at {:?}), waiting again",
                        self.config.timer.interval()
                    );
                }
                WaitOutcome::Completed(reaped) => {
                    handle.mark_reaped();
                    timer.dispatch_pending()?;
                    writeln!(out, "Stopped with {}", reaped.status)?;
                    info!(
                        "Worker {pid} terminated: {:?} after {interruptions} interruptions",
                        reaped.status.termination()
                    );
                    return Ok(Supervised { reaped, interruptions });
                }
                WaitOutcome::Failed(errno) => {
                    // The wait failure is the error worth reporting
                    if let Err(e) = timer.dispatch_pending() {
                        debug!("Dropping heartbeat error after failed wait: {e}");
                    }
                    writeln!(out, "Stopped with {errno}")?;
                    warn!("Giving up on worker {pid}: {errno}");
                    return Err(SupervisorError::WaitFailed { pid, errno });
                }
            }
        }
    }

    /// Spawn the worker, arm the timer and supervise until the worker is reaped.
    ///
    /// If arming fails, the already spawned worker is killed and reaped before
    /// the error is returned.
    ///
    /// # Errors
    /// Any error from [`Self::spawn`], [`Self::arm_periodic_signal`] or
    /// [`Self::supervise`].
    pub fn run<F: FnMut() -> io::Result<()>, W: Write>(
        &self,
        out: &mut W,
        on_heartbeat: F,
    ) -> Result<SupervisionReport, SupervisorError> {
        let started = Instant::now();

        let handle = self.spawn()?;
        let mut timer = self.arm_periodic_signal(on_heartbeat)?;
        let pid = handle.pid();
        writeln!(out, "PID: {pid}")?;

        let supervised = self.supervise(handle, &mut timer, out)?;
        let heartbeats = timer.disarm();

        Ok(SupervisionReport {
            pid: pid.as_raw(),
            status: supervised.reaped.status,
            usage: supervised.reaped.usage,
            interruptions: supervised.interruptions,
            heartbeats,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
