//! Domain model for tickwait
//!
//! This module contains core domain types and errors that provide:
//! - Validated configuration (a timer interval can never be zero)
//! - Decoded, immutable termination results
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{ExitStatus, ResourceUsage, SupervisionReport, Termination, TimerConfig};

pub use errors::{ExportError, SupervisorError};
