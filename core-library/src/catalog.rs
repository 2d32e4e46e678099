//! # Recitation Catalog
//!
//! Loads recitation metadata and text from the app's `data/` directory.
//!
//! Requests go through the injected [`HttpClient`], so on a host where
//! fetches are routed through the offline cache the catalog works offline
//! once the files have been seen.

use crate::error::{LibraryError, Result};
use crate::models::{Language, RecitationMeta, RecitationText};
use bridge_traits::http::{HttpClient, HttpRequest};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

pub struct RecitationCatalog {
    http_client: Arc<dyn HttpClient>,
    base_url: Url,
    /// Loaded metadata in configured key order.
    metadata: RwLock<Vec<RecitationMeta>>,
    texts: RwLock<HashMap<String, Arc<RecitationText>>>,
}

impl RecitationCatalog {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
            metadata: RwLock::new(Vec::new()),
            texts: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches `data/<key>/meta.json` for every key concurrently.
    ///
    /// Failures are logged and skipped. Returns the keys that loaded.
    #[instrument(skip(self, keys))]
    pub async fn load_metadata<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        let fetches = keys.iter().map(|key| self.fetch_meta(key.as_ref()));
        let results = join_all(fetches).await;

        let mut loaded = Vec::new();
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(meta) => loaded.push(meta),
                Err(e) => warn!(key = key.as_ref(), error = %e, "Skipping recitation"),
            }
        }

        let keys: Vec<String> = loaded.iter().map(|meta| meta.key.clone()).collect();
        debug!(count = keys.len(), "Loaded recitation metadata");
        *self.metadata.write() = loaded;
        keys
    }

    pub fn recitations(&self) -> Vec<RecitationMeta> {
        self.metadata.read().clone()
    }

    pub fn metadata(&self, key: &str) -> Option<RecitationMeta> {
        self.metadata
            .read()
            .iter()
            .find(|meta| meta.key == key)
            .cloned()
    }

    /// Menu order: `last_viewed` first, everything else in loaded order.
    pub fn menu_order(&self, last_viewed: Option<&str>) -> Vec<RecitationMeta> {
        let mut recitations = self.recitations();
        if let Some(last) = last_viewed {
            // Stable sort keeps the relative order of the rest.
            recitations.sort_by_key(|meta| meta.key != last);
        }
        recitations
    }

    /// Recitations whose name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<RecitationMeta> {
        self.metadata
            .read()
            .iter()
            .filter(|meta| meta.matches(query))
            .cloned()
            .collect()
    }

    /// Loads verse and translation text for `key`.
    ///
    /// Missing or failing languages are absent from the result. The text is
    /// memoized per key.
    ///
    /// # Errors
    ///
    /// [`LibraryError::NotFound`] when no metadata was loaded for `key`.
    #[instrument(skip(self))]
    pub async fn load_text(&self, key: &str) -> Result<Arc<RecitationText>> {
        if let Some(text) = self.texts.read().get(key) {
            return Ok(text.clone());
        }
        if self.metadata(key).is_none() {
            return Err(LibraryError::not_found("recitation", key));
        }

        let fetches = Language::ALL
            .iter()
            .map(|language| self.fetch_lines(key, *language));
        let results = join_all(fetches).await;

        let mut text = RecitationText::default();
        for (language, result) in Language::ALL.iter().zip(results) {
            match result {
                Ok(Some(lines)) => text.insert(*language, lines),
                Ok(None) => debug!(%language, "No text for language"),
                Err(e) => warn!(%language, error = %e, "Could not load text"),
            }
        }

        let text = Arc::new(text);
        self.texts
            .write()
            .entry(key.to_string())
            .or_insert_with(|| text.clone());
        Ok(text)
    }

    fn data_url(&self, key: &str, file: &str) -> Result<Url> {
        self.base_url
            .join(&format!("data/{}/{}", key, file))
            .map_err(|e| LibraryError::invalid("key", e.to_string()))
    }

    async fn fetch_meta(&self, key: &str) -> Result<RecitationMeta> {
        let url = self.data_url(key, "meta.json")?;
        let response = self
            .http_client
            .execute(HttpRequest::get(url.as_str()))
            .await?;

        if !response.is_success() {
            return Err(LibraryError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        let mut meta: RecitationMeta =
            serde_json::from_slice(&response.body).map_err(|e| LibraryError::Decode {
                what: format!("metadata for {}", key),
                message: e.to_string(),
            })?;
        meta.key = key.to_string();
        Ok(meta)
    }

    /// `Ok(None)` when the file does not exist.
    async fn fetch_lines(&self, key: &str, language: Language) -> Result<Option<Vec<String>>> {
        let url = self.data_url(key, language.file_name())?;
        let response = self
            .http_client
            .execute(HttpRequest::get(url.as_str()))
            .await?;

        if !response.is_success() {
            return Ok(None);
        }
        let body = response.text()?;
        Ok(Some(RecitationText::parse_lines(&body)))
    }
}
