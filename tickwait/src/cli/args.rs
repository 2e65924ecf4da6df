//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{SupervisorError, TimerConfig};
use crate::supervision::{SupervisorConfig, Worker};

#[derive(Parser, Debug)]
#[command(
    name = "tickwait",
    version,
    about = "Supervise a worker process while a periodic timer interrupts the wait",
    after_help = "\
EXAMPLES:
    tickwait                                 500ms heartbeat, 3s worker
    tickwait --interval 100 --worker 1000    Faster heartbeat, shorter worker
    tickwait --report run.json               Also write a JSON report"
)]
pub struct Args {
    /// Heartbeat timer interval in milliseconds (must be > 0)
    #[arg(short, long, value_name = "MS", default_value = "500")]
    pub interval: u64,

    /// How long the worker runs before exiting, in milliseconds
    #[arg(short, long = "worker", value_name = "MS", default_value = "3000")]
    pub worker_ms: u64,

    /// Exit code the worker terminates with
    #[arg(long, value_name = "CODE", default_value = "0")]
    pub exit_code: u8,

    /// Write a JSON supervision report to FILE
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// # Errors
    /// Returns [`SupervisorError::ZeroInterval`] for `--interval 0`.
    pub fn timer_config(&self) -> Result<TimerConfig, SupervisorError> {
        TimerConfig::new(Duration::from_millis(self.interval))
    }

    pub fn worker(&self) -> Worker {
        Worker::new(Duration::from_millis(self.worker_ms)).with_exit_code(self.exit_code)
    }

    /// # Errors
    /// See [`Args::timer_config`].
    pub fn supervisor_config(&self) -> Result<SupervisorConfig, SupervisorError> {
        Ok(SupervisorConfig { timer: self.timer_config()?, worker: self.worker() })
    }
}
