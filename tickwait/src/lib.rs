//! # tickwait - Heartbeat-Interrupted Worker Supervision
//!
//! tickwait forks a worker process and waits for it to terminate while a
//! periodic timer keeps interrupting the wait. Every interruption is
//! recognised as such and the wait is re-issued; only the worker's real
//! termination ends the loop, and its status is reported exactly once.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Supervisor (parent)                       │
//! │                                                               │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐       │
//! │  │    spawn     │──▶│ PeriodicTimer│──▶│  supervise   │       │
//! │  │   (fork)     │   │ (SIGALRM to  │   │ (wait4 loop) │       │
//! │  └──────┬───────┘   │  this thread)│   └──────┬───────┘       │
//! │         │           └──────────────┘          │               │
//! │         │                                     ▼               │
//! │         │                           ┌──────────────────┐      │
//! │         │                           │ SupervisionReport│      │
//! │         │                           │  (stdout / JSON) │      │
//! │         │                           └──────────────────┘      │
//! └─────────┼─────────────────────────────────────────────────────┘
//!           │ fork, PR_SET_PDEATHSIG=SIGKILL
//!           ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 Worker (child): sleep, then exit              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`supervision`]: the core
//!   - `spawn`: fork the worker; `ProcessHandle` kills and reaps on drop
//!   - `timer`: owned, thread-directed periodic timer with an injected callback
//!   - `wait`: `wait4` wrapper returning `Completed` / `Interrupted` / `Failed`
//!   - `supervisor`: the `Waiting -> Waiting -> Done` loop
//!   - `worker`: the fixed-lifetime child task
//! - [`domain`]: `TimerConfig`, `ExitStatus`, `ResourceUsage`, errors
//! - [`cli`]: command-line arguments
//! - [`preflight`]: signal mask and clock resolution checks
//! - [`process_lookup`]: `/proc/<pid>/stat` inspection
//! - [`export`]: JSON supervision report
//!
//! ## Console Protocol
//!
//! ```text
//! PID: <id>                once, after the timer is armed
//! Waiting                  before every wait attempt
//! SIG                      on every timer firing
//! Stopped with <status>    once, when the loop ends
//! ```

pub mod cli;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod process_lookup;
pub mod supervision;
