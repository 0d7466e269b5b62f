//! One-time readiness of the remote embed API.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::surface::EmbedApi;
use crate::CaptureResult;

/// Init-once, await-ready holder for the embed API.
///
/// The host signals readiness exactly once; every waiter, past or future,
/// observes the same API instance.
pub struct EmbedReadiness {
    tx: watch::Sender<Option<Arc<dyn EmbedApi>>>,
}

impl EmbedReadiness {
    /// Create an unsignalled readiness holder.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish the loaded API. Returns false if it was already published.
    pub fn signal_ready(&self, api: Arc<dyn EmbedApi>) -> bool {
        let mut api = Some(api);
        let published = self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = api.take();
            true
        });

        if published {
            info!("Embed API ready");
        } else {
            debug!("Embed API already ready, ignoring duplicate signal");
        }
        published
    }

    /// The API, if already published.
    pub fn get(&self) -> Option<Arc<dyn EmbedApi>> {
        self.tx.borrow().clone()
    }

    /// Wait until the API is published.
    pub async fn wait(&self) -> CaptureResult<Arc<dyn EmbedApi>> {
        let mut rx = self.tx.subscribe();
        let api = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| CaptureError::EmbedApiUnavailable)?;
        api.clone().ok_or(CaptureError::EmbedApiUnavailable)
    }
}

impl Default for EmbedReadiness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{EmbedHandle, RenderSurface};
    use frameclean_ipc::EmbedOptions;

    struct NullApi;

    impl EmbedApi for NullApi {
        fn construct(
            &self,
            _surface: &RenderSurface,
            _content_id: &str,
            _options: &EmbedOptions,
            _generation: u64,
        ) -> CaptureResult<Arc<dyn EmbedHandle>> {
            Err(CaptureError::EmbedApiUnavailable)
        }
    }

    #[tokio::test]
    async fn test_waiters_see_signal() {
        let readiness = Arc::new(EmbedReadiness::new());
        assert!(readiness.get().is_none());

        let waiter = {
            let readiness = Arc::clone(&readiness);
            tokio::spawn(async move { readiness.wait().await.is_ok() })
        };

        assert!(readiness.signal_ready(Arc::new(NullApi)));
        assert!(waiter.await.unwrap());
        assert!(readiness.get().is_some());
    }

    #[tokio::test]
    async fn test_signal_is_init_once() {
        let readiness = EmbedReadiness::new();
        let first: Arc<dyn EmbedApi> = Arc::new(NullApi);

        assert!(readiness.signal_ready(Arc::clone(&first)));
        assert!(!readiness.signal_ready(Arc::new(NullApi)));

        let current = readiness.wait().await.unwrap();
        assert!(Arc::ptr_eq(&current, &first));
    }
}
