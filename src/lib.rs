//! blobscout - Azure Storage account explorer
//!
//! Enumerates the containers and blobs of a storage account concurrently,
//! filters them by name and metadata, optionally downloads their content
//! and renders the result as a tree, a table or a JSON/YAML document.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod report;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use error::{BlobscoutError, Result};
