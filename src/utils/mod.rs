//! Utility functions module
//!
//! Date/time handling and output formatting helpers.

pub mod datetime;
pub mod format;

pub use format::*;
