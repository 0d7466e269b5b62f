//! Remote subtitle/logo removal client.
//!
//! [`EnhancementClient`] applies the pass-through policy on top of a raw
//! [`EnhancementBackend`]: only credential rejections escape as errors,
//! every other failure degrades to returning the input image unchanged.

mod backend;
mod client;
mod credential;
mod error;
mod gemini;
mod purpose;

pub use backend::{EnhancementBackend, EnhancementRequest, Enhancer};
pub use client::EnhancementClient;
pub use credential::Credential;
pub use error::{is_credential_rejection, EnhanceError, CREDENTIAL_REJECTION_MARKERS};
pub use gemini::GeminiBackend;
pub use purpose::Purpose;

/// Result type for enhancement operations.
pub type EnhanceResult<T> = Result<T, EnhanceError>;
