//! Configuration management module
//!
//! Persistent settings come from the configuration file and environment;
//! each run folds them together with the command line into [`ScanOptions`].

pub mod options;
pub mod settings;

pub use options::*;
pub use settings::*;
