//! Credential resolution for the storage account
//!
//! A shared access key takes precedence; otherwise a managed identity is
//! used, user-assigned when a client id is given and system-assigned when
//! not. Credentials are checked once before any listing starts.

use crate::error::{BlobscoutError, Result};
use azure_core::auth::TokenCredential;
use crate::auth::imds::UserAssignedIdentityCredential;
use azure_identity::{TokenCredentialOptions, VirtualMachineManagedIdentityCredential};
use azure_storage::StorageCredentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Scope requested when verifying a managed identity
const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// How to authenticate against the storage account
#[derive(Clone)]
pub enum CredentialSource {
    AccessKey(Zeroizing<String>),
    UserAssignedIdentity(String),
    SystemAssignedIdentity,
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessKey(_) => f.write_str("AccessKey(***)"),
            Self::UserAssignedIdentity(id) => write!(f, "UserAssignedIdentity({id})"),
            Self::SystemAssignedIdentity => f.write_str("SystemAssignedIdentity"),
        }
    }
}

impl CredentialSource {
    /// Pick the credential from the access key and managed identity arguments
    pub fn from_args(access_key: Option<String>, msi: Option<String>) -> Result<Self> {
        let access_key = access_key.filter(|k| !k.trim().is_empty());
        let msi = msi.filter(|m| !m.trim().is_empty());

        match (access_key, msi) {
            (Some(_), Some(_)) => Err(BlobscoutError::invalid_argument(
                "--accessKey and --msi cannot be used together",
            )),
            (Some(key), None) => Ok(Self::AccessKey(Zeroizing::new(key))),
            (None, Some(client_id)) => Ok(Self::UserAssignedIdentity(client_id)),
            (None, None) => Ok(Self::SystemAssignedIdentity),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::AccessKey(_) => "shared access key",
            Self::UserAssignedIdentity(_) => "user-assigned managed identity",
            Self::SystemAssignedIdentity => "system-assigned managed identity",
        }
    }

    /// Build SDK credentials, failing fast on anything unusable
    pub async fn storage_credentials(&self, account: &str) -> Result<StorageCredentials> {
        debug!("Authenticating to {} with {}", account, self.describe());

        match self {
            Self::AccessKey(key) => {
                STANDARD.decode(key.as_bytes()).map_err(|e| {
                    BlobscoutError::authentication(format!("Access key is not valid base64: {e}"))
                })?;
                Ok(StorageCredentials::access_key(
                    account.to_string(),
                    key.to_string(),
                ))
            }
            Self::UserAssignedIdentity(_) => match self.user_assigned_credential() {
                Some(credential) => verified(Arc::new(credential)).await,
                None => Err(BlobscoutError::authentication("No managed identity client id")),
            },
            Self::SystemAssignedIdentity => {
                let credential =
                    VirtualMachineManagedIdentityCredential::new(TokenCredentialOptions::default());
                verified(Arc::new(credential)).await
            }
        }
    }

    /// IMDS credential for the user-assigned identity, if that is the source
    pub fn user_assigned_credential(&self) -> Option<UserAssignedIdentityCredential> {
        match self {
            Self::UserAssignedIdentity(client_id) => {
                Some(UserAssignedIdentityCredential::new(client_id.clone()))
            }
            _ => None,
        }
    }
}

async fn verified(credential: Arc<dyn TokenCredential>) -> Result<StorageCredentials> {
    credential
        .get_token(&[STORAGE_SCOPE])
        .await
        .map_err(|e| {
            BlobscoutError::authentication(format!("Failed to acquire managed identity token: {e}"))
        })?;

    Ok(StorageCredentials::token_credential(credential))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_takes_precedence_alone() {
        let source = CredentialSource::from_args(Some("a2V5".to_string()), None).unwrap();
        assert!(matches!(source, CredentialSource::AccessKey(_)));
        assert_eq!(format!("{source:?}"), "AccessKey(***)");
    }

    #[test]
    fn test_identity_selection() {
        let user = CredentialSource::from_args(None, Some("client-id".to_string())).unwrap();
        assert!(matches!(user, CredentialSource::UserAssignedIdentity(ref id) if id == "client-id"));

        let system = CredentialSource::from_args(None, Some("  ".to_string())).unwrap();
        assert!(matches!(system, CredentialSource::SystemAssignedIdentity));
    }

    #[test]
    fn test_user_assigned_identity_keeps_client_id() {
        let source = CredentialSource::from_args(None, Some("client-id".to_string())).unwrap();
        let credential = source.user_assigned_credential().unwrap();
        assert_eq!(credential.client_id(), "client-id");

        let url = credential.token_url("https://storage.azure.com").unwrap();
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "client_id" && v == "client-id"));

        let system = CredentialSource::from_args(None, None).unwrap();
        assert!(system.user_assigned_credential().is_none());
    }

    #[test]
    fn test_key_and_identity_conflict() {
        let result = CredentialSource::from_args(Some("a2V5".to_string()), Some("id".to_string()));
        assert!(matches!(result, Err(BlobscoutError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_invalid_access_key_is_authentication_error() {
        let source = CredentialSource::from_args(Some("not base64!".to_string()), None).unwrap();
        let result = source.storage_credentials("acct").await;
        assert!(matches!(result, Err(BlobscoutError::AuthenticationError(_))));
    }
}
