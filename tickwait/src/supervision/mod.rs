//! Supervision core
//!
//! - Worker process creation and ownership (kill-on-drop handles)
//! - The owned, thread-directed periodic timer
//! - The interruptible wait primitive
//! - The supervisor loop tying them together

pub mod spawn;
pub mod supervisor;
pub mod timer;
pub mod wait;
pub mod worker;

// Re-export common types
pub use spawn::{ForkLauncher, Launcher, ProcessHandle};
pub use supervisor::{Supervised, Supervisor, SupervisorConfig};
pub use timer::{is_timer_armed, PeriodicTimer};
pub use wait::{wait_once, Reaped, WaitOutcome};
pub use worker::Worker;
