//! Pre-flight checks for tickwait
//!
//! Validates the calling thread's signal state before the timer is armed.
//! Provides clear, actionable messages when something would silently break
//! the heartbeat.

use anyhow::{Context, Result};
use log::{debug, warn};
use nix::sys::signal::{SigSet, Signal};
use nix::time::{clock_getres, ClockId};
use std::time::Duration;

use crate::domain::TimerConfig;

/// Run all pre-flight checks on the thread that will supervise
pub fn run_preflight_checks(timer: &TimerConfig, quiet: bool) -> Result<()> {
    ensure_alarm_unblocked()?;
    check_timer_resolution(timer, quiet)?;
    Ok(())
}

/// Make sure `SIGALRM` can reach this thread.
///
/// A blocked signal stays pending instead of interrupting the wait, so no
/// heartbeat would ever be seen. An inherited block is lifted with a warning.
fn ensure_alarm_unblocked() -> Result<()> {
    let mask = SigSet::thread_get_mask().context("Failed to read thread signal mask")?;
    if !mask.contains(Signal::SIGALRM) {
        return Ok(());
    }

    warn!("SIGALRM was blocked (inherited signal mask), unblocking it");
    let mut alarm = SigSet::empty();
    alarm.add(Signal::SIGALRM);
    alarm.thread_unblock().context("Failed to unblock SIGALRM")?;
    Ok(())
}

/// Warn if the interval is finer than the monotonic clock can resolve
fn check_timer_resolution(timer: &TimerConfig, quiet: bool) -> Result<()> {
    let resolution: Duration = clock_getres(ClockId::CLOCK_MONOTONIC)
        .context("Failed to query CLOCK_MONOTONIC resolution")?
        .into();
    debug!("CLOCK_MONOTONIC resolution: {resolution:?}");

    if timer.interval() < resolution && !quiet {
        eprintln!(
            "warning: interval {:?} is below clock resolution {resolution:?}, ticks will be coarser",
            timer.interval()
        );
    }
    Ok(())
}
