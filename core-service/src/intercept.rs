//! Foreground HTTP client whose requests are answered by the cache router.
//!
//! Catalog, text and timing fetches use it so they get the same offline
//! treatment as any other request of the running client.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_cache::CacheWorkerHandle;

#[derive(Clone)]
pub struct CacheRoutedHttpClient {
    cache: CacheWorkerHandle,
}

impl CacheRoutedHttpClient {
    pub fn new(cache: CacheWorkerHandle) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl HttpClient for CacheRoutedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.cache
            .fetch(request)
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))
    }
}
