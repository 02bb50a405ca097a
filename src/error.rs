use thiserror::Error;

/// Main error type for blobscout operations
#[derive(Debug, Error)]
pub enum BlobscoutError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Failed to list {scope}: {details}")]
    ListingError { scope: String, details: String },

    #[error("Failed to download blob '{blob}' from container '{container}': {details}")]
    DownloadError {
        container: String,
        blob: String,
        details: String,
    },

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Enumeration task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl BlobscoutError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn listing<S: Into<String>, D: Into<String>>(scope: S, details: D) -> Self {
        Self::ListingError {
            scope: scope.into(),
            details: details.into(),
        }
    }

    pub fn download<C: Into<String>, B: Into<String>, D: Into<String>>(
        container: C,
        blob: B,
        details: D,
    ) -> Self {
        Self::DownloadError {
            container: container.into(),
            blob: blob.into(),
            details: details.into(),
        }
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }
}

/// Result type alias for blobscout operations
pub type Result<T> = std::result::Result<T, BlobscoutError>;

/// Convert Azure Core errors to BlobscoutError
impl From<azure_core::Error> for BlobscoutError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}

impl From<tokio::task::JoinError> for BlobscoutError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::TaskFailed(error.to_string())
    }
}
