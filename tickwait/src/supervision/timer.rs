//! Owned periodic heartbeat timer
//!
//! A POSIX timer delivers `SIGALRM` directly to the thread that armed it
//! (`SIGEV_THREAD_ID`), so it interrupts that thread's blocking calls and no
//! other thread's. The signal handler only bumps a counter; the injected
//! callback runs later, on the supervising thread, from
//! [`PeriodicTimer::dispatch_pending`].
//!
//! Signal dispositions are process-wide, so at most one `PeriodicTimer` may
//! be armed at a time.

#![allow(unsafe_code)] // sigaction() requires unsafe

use log::{debug, warn};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigEvent, SigHandler, SigSet, SigevNotify, Signal};
use nix::sys::time::TimeSpec;
use nix::sys::timer::{Expiration, Timer, TimerSetTimeFlags};
use nix::time::ClockId;
use nix::unistd::gettid;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::domain::{SupervisorError, TimerConfig};

const TIMER_SIGNAL: Signal = Signal::SIGALRM;

static ARMED: AtomicBool = AtomicBool::new(false);
static PENDING_TICKS: AtomicU64 = AtomicU64::new(0);

extern "C" fn record_tick(_: libc::c_int) {
    PENDING_TICKS.fetch_add(1, Ordering::Relaxed);
}

/// A repeating timer scoped to one supervision run.
///
/// Dropping it deletes the kernel timer and restores the previous `SIGALRM`
/// disposition.
pub struct PeriodicTimer<F: FnMut() -> io::Result<()>> {
    timer: Option<Timer>,
    previous: SigAction,
    config: TimerConfig,
    on_tick: F,
    dispatched: u64,
}

impl<F: FnMut() -> io::Result<()>> PeriodicTimer<F> {
    /// Install the tick handler and start the timer.
    ///
    /// The first tick fires one interval after arming.
    ///
    /// # Errors
    /// - [`SupervisorError::TimerBusy`] if another timer is armed
    /// - [`SupervisorError::TimerArmFailed`] if the handler or timer can't be set up
    pub fn arm(config: TimerConfig, on_tick: F) -> Result<Self, SupervisorError> {
        if ARMED.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(SupervisorError::TimerBusy);
        }
        PENDING_TICKS.store(0, Ordering::Relaxed);

        // No SA_RESTART: a tick must make a blocked wait4() fail with EINTR
        let action =
            SigAction::new(SigHandler::Handler(record_tick), SaFlags::empty(), SigSet::empty());
        // SAFETY: record_tick only touches an atomic, which is async-signal-safe
        let previous = match unsafe { sigaction(TIMER_SIGNAL, &action) } {
            Ok(previous) => previous,
            Err(e) => {
                ARMED.store(false, Ordering::Release);
                return Err(SupervisorError::TimerArmFailed(e));
            }
        };

        let timer = match start_thread_timer(config) {
            Ok(timer) => timer,
            Err(e) => {
                restore_disposition(&previous);
                ARMED.store(false, Ordering::Release);
                return Err(SupervisorError::TimerArmFailed(e));
            }
        };

        debug!("Armed periodic timer every {:?}", config.interval());
        Ok(Self { timer: Some(timer), previous, config, on_tick, dispatched: 0 })
    }

    /// Run the callback once for every tick recorded since the last dispatch.
    ///
    /// Returns the number of ticks dispatched.
    ///
    /// # Errors
    /// Returns [`SupervisorError::Io`] from the first failing callback; the
    /// remaining ticks of this batch are dropped.
    pub fn dispatch_pending(&mut self) -> Result<u64, SupervisorError> {
        let ticks = PENDING_TICKS.swap(0, Ordering::AcqRel);
        for _ in 0..ticks {
            (self.on_tick)()?;
            self.dispatched += 1;
        }
        Ok(ticks)
    }

    /// Total ticks dispatched to the callback so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    /// Stop the timer, returning the total number of dispatched ticks.
    ///
    /// Ticks still pending at this point are discarded.
    pub fn disarm(self) -> u64 {
        self.dispatched
    }
}

/// Whether any [`PeriodicTimer`] is currently armed in this process
pub fn is_timer_armed() -> bool {
    ARMED.load(Ordering::Acquire)
}

impl<F: FnMut() -> io::Result<()>> Drop for PeriodicTimer<F> {
    fn drop(&mut self) {
        // Deleting the timer first also drops its queued, undelivered signal
        drop(self.timer.take());
        restore_disposition(&self.previous);
        PENDING_TICKS.store(0, Ordering::Relaxed);
        ARMED.store(false, Ordering::Release);
        debug!("Disarmed periodic timer after {} ticks", self.dispatched);
    }
}

fn start_thread_timer(config: TimerConfig) -> nix::Result<Timer> {
    let event = SigEvent::new(SigevNotify::SigevThreadId {
        signal: TIMER_SIGNAL,
        thread_id: gettid().as_raw(),
        si_value: 0,
    });
    let mut timer = Timer::new(ClockId::CLOCK_MONOTONIC, event)?;
    let interval = TimeSpec::from_duration(config.interval());
    timer.set(Expiration::Interval(interval), TimerSetTimeFlags::empty())?;
    Ok(timer)
}

fn restore_disposition(previous: &SigAction) {
    // SAFETY: reinstating a disposition that was in effect before arming
    if let Err(e) = unsafe { sigaction(TIMER_SIGNAL, previous) } {
        warn!("Failed to restore {TIMER_SIGNAL} disposition: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::cell::Cell;
    use std::time::Duration;

    fn quiet() -> io::Result<()> {
        Ok(())
    }

    fn config(ms: u64) -> TimerConfig {
        TimerConfig::new(Duration::from_millis(ms)).unwrap()
    }

    #[test]
    #[serial]
    fn test_ticks_are_dispatched_to_callback() {
        let fired = Cell::new(0u64);
        let mut timer = PeriodicTimer::arm(config(20), || {
            fired.set(fired.get() + 1);
            Ok(())
        })
        .unwrap();

        // thread::sleep resumes after EINTR, so the full span elapses
        std::thread::sleep(Duration::from_millis(130));
        let ticks = timer.dispatch_pending().unwrap();

        assert!(ticks >= 3, "expected several ticks, got {ticks}");
        assert_eq!(timer.dispatched(), ticks);
        drop(timer);
        assert_eq!(fired.get(), ticks);
    }

    #[test]
    #[serial]
    fn test_second_timer_is_rejected() {
        let first = PeriodicTimer::arm(config(1000), quiet).unwrap();
        assert!(is_timer_armed());

        let second = PeriodicTimer::arm(config(1000), quiet);
        assert!(matches!(second, Err(SupervisorError::TimerBusy)));

        drop(first);
        assert!(!is_timer_armed());
    }

    #[test]
    #[serial]
    fn test_rearm_after_disarm() {
        let timer = PeriodicTimer::arm(config(1000), quiet).unwrap();
        assert_eq!(timer.disarm(), 0);

        let again = PeriodicTimer::arm(config(250), quiet).unwrap();
        assert_eq!(again.config().interval(), Duration::from_millis(250));
    }

    #[test]
    #[serial]
    fn test_no_ticks_before_first_interval() {
        let mut timer = PeriodicTimer::arm(config(10_000), quiet).unwrap();
        assert_eq!(timer.dispatch_pending().unwrap(), 0);
    }

    #[test]
    #[serial]
    fn test_failing_callback_surfaces_io_error() {
        let mut timer = PeriodicTimer::arm(config(20), || {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(70));
        let result = timer.dispatch_pending();

        assert!(matches!(result, Err(SupervisorError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(timer.dispatched(), 0);
    }
}
