//! Pass-through policy over the raw enhancement call.

use std::sync::Arc;

use async_trait::async_trait;
use frameclean_capture::EncodedImage;
use tracing::{error, info, instrument, warn};

use crate::backend::{EnhancementBackend, EnhancementRequest, Enhancer};
use crate::credential::Credential;
use crate::error::EnhanceError;
use crate::purpose::Purpose;
use crate::EnhanceResult;

/// Enhancement client used by the studio.
#[derive(Clone)]
pub struct EnhancementClient {
    backend: Arc<dyn EnhancementBackend>,
}

impl EnhancementClient {
    /// Wrap a raw backend.
    pub fn new(backend: Arc<dyn EnhancementBackend>) -> Self {
        Self { backend }
    }

    /// Enhance `image` for `purpose`.
    ///
    /// Returns the input unchanged when the service produced no image or
    /// failed for any reason other than the credential. A rejected
    /// credential is the only error returned.
    #[instrument(name = "enhance", skip(self, image, credential), fields(bytes = image.len()))]
    pub async fn enhance(
        &self,
        image: EncodedImage,
        purpose: Purpose,
        credential: &Credential,
    ) -> EnhanceResult<EncodedImage> {
        let request = EnhancementRequest::new(purpose, image);

        match self.backend.generate(&request, credential).await {
            Ok(Some(enhanced)) => {
                info!(bytes = enhanced.len(), mime = %enhanced.mime_type, "Enhanced image received");
                Ok(enhanced)
            }
            Ok(None) => {
                warn!("Service returned no image, passing the original through");
                Ok(request.image)
            }
            Err(e) if e.is_credential_rejection() => {
                warn!("Enhancement service rejected the credential");
                Err(EnhanceError::CredentialRejected(e.to_string()))
            }
            Err(e) => {
                error!("Enhancement failed, passing the original through: {}", e);
                Ok(request.image)
            }
        }
    }
}

#[async_trait]
impl Enhancer for EnhancementClient {
    async fn enhance(
        &self,
        image: EncodedImage,
        purpose: Purpose,
        credential: &Credential,
    ) -> EnhanceResult<EncodedImage> {
        EnhancementClient::enhance(self, image, purpose, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    enum Script {
        Image(EncodedImage),
        NoImage,
        Fail(fn() -> EnhanceError),
    }

    struct ScriptedBackend {
        script: Script,
        seen: Mutex<Vec<Purpose>>,
    }

    #[async_trait]
    impl EnhancementBackend for ScriptedBackend {
        async fn generate(
            &self,
            request: &EnhancementRequest,
            _credential: &Credential,
        ) -> EnhanceResult<Option<EncodedImage>> {
            self.seen.lock().push(request.purpose);
            match &self.script {
                Script::Image(image) => Ok(Some(image.clone())),
                Script::NoImage => Ok(None),
                Script::Fail(make) => Err(make()),
            }
        }
    }

    fn client(script: Script) -> (EnhancementClient, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend {
            script,
            seen: Mutex::new(Vec::new()),
        });
        (EnhancementClient::new(backend.clone()), backend)
    }

    fn input() -> EncodedImage {
        EncodedImage::jpeg(vec![9u8, 9, 9])
    }

    fn key() -> Credential {
        Credential::new("key").unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_enhanced_image() {
        let enhanced = EncodedImage::new(vec![1u8], "image/png");
        let (client, backend) = client(Script::Image(enhanced.clone()));

        let result = client
            .enhance(input(), Purpose::SubtitleRemoval, &key())
            .await
            .unwrap();

        assert_eq!(result, enhanced);
        assert_eq!(*backend.seen.lock(), vec![Purpose::SubtitleRemoval]);
    }

    #[tokio::test]
    async fn test_no_image_passes_input_through() {
        let (client, _) = client(Script::NoImage);
        let result = client
            .enhance(input(), Purpose::LogoRemoval, &key())
            .await
            .unwrap();
        assert_eq!(result, input());
    }

    #[tokio::test]
    async fn test_unclassified_failure_passes_input_through() {
        let (client, _) = client(Script::Fail(|| EnhanceError::Api {
            status: 503,
            code: Some("UNAVAILABLE".into()),
            message: "The model is overloaded".into(),
        }));
        let result = client
            .enhance(input(), Purpose::SubtitleRemoval, &key())
            .await
            .unwrap();
        assert_eq!(result, input());
    }

    #[tokio::test]
    async fn test_credential_rejection_propagates() {
        let (client, _) = client(Script::Fail(|| EnhanceError::Api {
            status: 403,
            code: None,
            message: "The caller does not have permission to access this resource".into(),
        }));
        let err = client
            .enhance(input(), Purpose::SubtitleRemoval, &key())
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::CredentialRejected(_)));
    }
}
