//! Error types for the enhancement module.

use thiserror::Error;

/// Substrings / status codes the service uses when it rejects a credential.
pub const CREDENTIAL_REJECTION_MARKERS: [&str; 4] = [
    "API key not valid",
    "permission to access",
    "PERMISSION_DENIED",
    "UNAUTHENTICATED",
];

/// Errors that can occur while calling the enhancement service.
#[derive(Debug, Error)]
pub enum EnhanceError {
    /// The service rejected the credential.
    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    /// The service returned an error body.
    #[error("Enhancement API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,

        /// Service status string, e.g. `INVALID_ARGUMENT`.
        code: Option<String>,

        /// Error message.
        message: String,
    },

    /// The HTTP exchange failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl EnhanceError {
    /// Returns true if this error means the credential is bad.
    pub fn is_credential_rejection(&self) -> bool {
        match self {
            Self::CredentialRejected(_) => true,
            Self::Api { code, message, .. } => {
                is_credential_rejection(message)
                    || code.as_deref().is_some_and(is_credential_rejection)
            }
            _ => false,
        }
    }
}

/// Returns true if `message` carries a known credential-rejection marker.
pub fn is_credential_rejection(message: &str) -> bool {
    CREDENTIAL_REJECTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
