//! Report export functionality
//!
//! This module writes the outcome of a supervision run to JSON, so scripts
//! can check exit status, interruption counts and resource usage without
//! scraping the console markers.

pub mod json_report;

pub use json_report::ReportExporter;
