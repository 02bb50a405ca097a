//! Authentication module for Azure Storage
//!
//! Resolves the shared access key or managed identity used to reach the
//! storage account.

pub mod imds;
pub mod provider;

pub use imds::UserAssignedIdentityCredential;
pub use provider::*;
