//! The raw request/response call to the enhancement service.

use async_trait::async_trait;
use frameclean_capture::EncodedImage;

use crate::credential::Credential;
use crate::purpose::Purpose;
use crate::EnhanceResult;

/// One enhancement request.
#[derive(Debug, Clone)]
pub struct EnhancementRequest {
    /// What to remove.
    pub purpose: Purpose,

    /// Image to transform.
    pub image: EncodedImage,
}

impl EnhancementRequest {
    pub fn new(purpose: Purpose, image: EncodedImage) -> Self {
        Self { purpose, image }
    }

    /// Instruction text for this request.
    pub fn instruction(&self) -> &'static str {
        self.purpose.instruction()
    }
}

/// A single remote call, with no retry or fallback policy.
#[async_trait]
pub trait EnhancementBackend: Send + Sync {
    /// Send the request. `Ok(None)` means the service answered without an image.
    async fn generate(
        &self,
        request: &EnhancementRequest,
        credential: &Credential,
    ) -> EnhanceResult<Option<EncodedImage>>;
}

/// Anything that turns an image into an enhanced image.
///
/// The only error an implementation should return is a credential
/// rejection; callers still treat other errors as failures.
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(
        &self,
        image: EncodedImage,
        purpose: Purpose,
        credential: &Credential,
    ) -> EnhanceResult<EncodedImage>;
}
