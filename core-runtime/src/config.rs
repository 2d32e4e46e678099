//! # Core Configuration Module
//!
//! Provides configuration management for the recitation core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core library.
//! It enforces fail-fast validation to ensure all required bridges are provided
//! before initialization.
//!
//! ## Required Dependencies
//!
//! - `ResourceBackend` - Durable storage behind the offline cache
//! - `SettingsStore` - User preferences and cache intents
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `Clock` - Time source (default: system clock)
//!
//! When the `desktop-shims` feature is enabled,
//! [`CoreConfigBuilder::build_with_desktop_defaults`] injects SQLite-backed
//! stores under the data directory for any bridge that was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .app_base_url("https://dua.example/")
//!     .shell_cache_version(5)
//!     .http_client(Arc::new(MyHttpClient))
//!     .resource_backend(Arc::new(MyBackend))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .build()?;
//!
//! assert_eq!(config.shell_namespace(), "app-shell-v5");
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable error
//! messages when capabilities are missing:
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // This will panic with an actionable error message
//! let config = CoreConfig::builder()
//!     .app_base_url("https://dua.example/")
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, ResourceBackend, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Public CORS proxy that cross-origin media is funneled through.
pub const DEFAULT_PROXY_PREFIX: &str = "https://corsproxy.io/?";

/// Generation of the shell namespace.
pub const DEFAULT_SHELL_CACHE_VERSION: u32 = 4;

/// Generation of the media namespace.
pub const DEFAULT_MEDIA_CACHE_VERSION: u32 = 1;

/// Minimum set of resources needed to render the app with zero network.
pub const DEFAULT_RESOURCE_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./index.css",
    "./index.js",
    "./manifest.json",
    "https://fonts.googleapis.com/css2?family=Amiri:wght@700&family=Vazirmatn:wght@400;700&family=Noto+Naskh+Arabic:wght@700&display=swap",
];

/// File extensions that mark a request as media.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] =
    &[".mp3", ".m4a", ".aac", ".ogg", ".opus", ".wav", ".flac"];

/// Path fragments that mark a request as media.
pub const DEFAULT_MEDIA_PATH_PATTERNS: &[&str] = &["/audio/"];

/// Recitations listed in the menu.
pub const DEFAULT_RECITATION_KEYS: &[&str] = &["ashura", "ahd", "tawassul", "kumayl", "sabah"];

/// Quiet period after the last scroll gesture before auto-scroll resumes.
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(250);

/// Step used by the relative seek buttons.
pub const DEFAULT_SEEK_STEP: Duration = Duration::from_secs(5);

/// Capacity of the cache command queue.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 64;

/// Core configuration for the recitation core.
///
/// This struct holds all dependencies and settings required to initialize
/// the core library. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL the app is served from; relative resources resolve against it
    pub app_base_url: Url,

    /// Prefix prepended to percent-encoded cross-origin URLs
    pub proxy_prefix: String,

    /// Generation number of the shell namespace (`app-shell-v<N>`)
    pub shell_cache_version: u32,

    /// Generation number of the media namespace (`media-v<N>`)
    pub media_cache_version: u32,

    /// Ordered shell resources populated at install time
    pub resource_manifest: Vec<String>,

    /// Extensions classifying a request as media
    pub media_extensions: Vec<String>,

    /// Path fragments classifying a request as media
    pub media_path_patterns: Vec<String>,

    /// Scroll-suppression debounce
    pub scroll_debounce: Duration,

    /// Relative seek step
    pub seek_step: Duration,

    /// Recitations available in the catalog
    pub recitation_keys: Vec<String>,

    /// Capacity of the background command queue
    pub command_queue_capacity: usize,

    /// Directory for desktop databases (desktop defaults only)
    pub data_dir: Option<PathBuf>,

    /// HTTP client for every network access (optional with desktop default)
    pub http_client: Arc<dyn HttpClient>,

    /// Durable storage behind the offline cache (required)
    pub resource_backend: Arc<dyn ResourceBackend>,

    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("app_base_url", &self.app_base_url.as_str())
            .field("proxy_prefix", &self.proxy_prefix)
            .field("shell_cache_version", &self.shell_cache_version)
            .field("media_cache_version", &self.media_cache_version)
            .field("resource_manifest", &self.resource_manifest)
            .field("media_extensions", &self.media_extensions)
            .field("media_path_patterns", &self.media_path_patterns)
            .field("scroll_debounce", &self.scroll_debounce)
            .field("seek_step", &self.seek_step)
            .field("recitation_keys", &self.recitation_keys)
            .field("command_queue_capacity", &self.command_queue_capacity)
            .field("data_dir", &self.data_dir)
            .field("http_client", &"HttpClient { ... }")
            .field("resource_backend", &"ResourceBackend { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Name of the current shell namespace.
    pub fn shell_namespace(&self) -> String {
        format!("app-shell-v{}", self.shell_cache_version)
    }

    /// Name of the current media namespace.
    pub fn media_namespace(&self) -> String {
        format!("media-v{}", self.media_cache_version)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is http(s) and can be joined against
    /// - The proxy prefix is an absolute http(s) URL
    /// - The manifest is non-empty
    /// - Media rules are well-formed
    /// - Durations and capacities are non-zero
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.app_base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "App base URL must be http(s), got '{}'",
                self.app_base_url
            )));
        }

        if self.app_base_url.cannot_be_a_base() {
            return Err(Error::Config(
                "App base URL cannot be used to resolve relative resources".to_string(),
            ));
        }

        if self.proxy_prefix.is_empty() {
            return Err(Error::Config("Proxy prefix cannot be empty".to_string()));
        }

        match Url::parse(&self.proxy_prefix) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(Error::Config(format!(
                    "Proxy prefix must be an absolute http(s) URL, got '{}'",
                    self.proxy_prefix
                )))
            }
        }

        if self.resource_manifest.is_empty() {
            return Err(Error::Config(
                "Resource manifest cannot be empty; the app could not render offline"
                    .to_string(),
            ));
        }

        if let Some(ext) = self
            .media_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(Error::Config(format!(
                "Media extension '{}' must start with '.'",
                ext
            )));
        }

        if self.media_path_patterns.iter().any(|pattern| pattern.is_empty()) {
            return Err(Error::Config(
                "Media path patterns cannot be empty strings".to_string(),
            ));
        }

        if self.scroll_debounce.is_zero() {
            return Err(Error::Config(
                "Scroll debounce must be greater than 0ms".to_string(),
            ));
        }

        if self.seek_step.is_zero() {
            return Err(Error::Config("Seek step must be greater than 0".to_string()));
        }

        if self.command_queue_capacity == 0 {
            return Err(Error::Config(
                "Command queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn resource_backend_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ResourceBackend".to_string(),
        message: "ResourceBackend implementation is required for the offline cache. \
                 Desktop: enable the 'desktop-shims' feature and use build_with_desktop_defaults() \
                 to get the default SqliteResourceBackend. \
                 Web: inject a Cache Storage backed implementation."
            .to_string(),
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for user preferences. \
                 Desktop: enable the 'desktop-shims' feature and use build_with_desktop_defaults() \
                 to get the default SqliteSettingsStore. \
                 Web: inject a localStorage-based settings store."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: format!("Failed to create the default ReqwestHttpClient: {}", e),
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for network access. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Web: inject a fetch-based client."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    app_base_url: Option<String>,
    proxy_prefix: Option<String>,
    shell_cache_version: Option<u32>,
    media_cache_version: Option<u32>,
    resource_manifest: Option<Vec<String>>,
    media_extensions: Option<Vec<String>>,
    media_path_patterns: Option<Vec<String>>,
    scroll_debounce: Option<Duration>,
    seek_step: Option<Duration>,
    recitation_keys: Option<Vec<String>>,
    command_queue_capacity: Option<usize>,
    data_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    resource_backend: Option<Arc<dyn ResourceBackend>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl CoreConfigBuilder {
    /// Sets the URL the app is served from (required).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .app_base_url("https://dua.example/");
    /// ```
    pub fn app_base_url(mut self, url: impl Into<String>) -> Self {
        self.app_base_url = Some(url.into());
        self
    }

    /// Sets the CORS proxy prefix.
    ///
    /// Default: `https://corsproxy.io/?`
    pub fn proxy_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.proxy_prefix = Some(prefix.into());
        self
    }

    /// Sets the shell namespace generation. Bumping it retires the previous
    /// shell namespace on the next activation.
    ///
    /// Default: 4
    pub fn shell_cache_version(mut self, version: u32) -> Self {
        self.shell_cache_version = Some(version);
        self
    }

    /// Sets the media namespace generation.
    ///
    /// Default: 1
    pub fn media_cache_version(mut self, version: u32) -> Self {
        self.media_cache_version = Some(version);
        self
    }

    /// Sets the ordered shell resources populated at install time.
    pub fn resource_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_manifest = Some(manifest.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the extensions classifying a request as media.
    pub fn media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_extensions = Some(
            extensions
                .into_iter()
                .map(|ext| ext.into().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    /// Sets the path fragments classifying a request as media.
    pub fn media_path_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_path_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the scroll-suppression debounce.
    ///
    /// Default: 250ms
    pub fn scroll_debounce(mut self, debounce: Duration) -> Self {
        self.scroll_debounce = Some(debounce);
        self
    }

    /// Sets the relative seek step.
    ///
    /// Default: 5s
    pub fn seek_step(mut self, step: Duration) -> Self {
        self.seek_step = Some(step);
        self
    }

    /// Sets the recitations listed in the catalog.
    pub fn recitation_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recitation_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the capacity of the background command queue.
    ///
    /// Default: 64
    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = Some(capacity);
        self
    }

    /// Sets the directory for desktop databases.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the resource backend implementation (required).
    pub fn resource_backend(mut self, backend: Arc<dyn ResourceBackend>) -> Self {
        self.resource_backend = Some(backend);
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the time source.
    ///
    /// Default: [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fills every missing storage bridge with the SQLite defaults from
    /// `bridge-desktop`, then builds.
    ///
    /// Databases live under the configured data directory, or the platform
    /// data directory when none was set.
    #[cfg(feature = "desktop-shims")]
    pub async fn build_with_desktop_defaults(mut self) -> Result<CoreConfig> {
        use bridge_desktop::{default_data_dir, SqliteResourceBackend, SqliteSettingsStore};

        let data_dir = self.data_dir.clone().unwrap_or_else(default_data_dir);

        if self.resource_backend.is_none() {
            let backend = SqliteResourceBackend::new(data_dir.join("cache.db"))
                .await
                .map_err(|e| {
                    Error::Internal(format!("Failed to initialize default ResourceBackend: {}", e))
                })?;
            self.resource_backend = Some(Arc::new(backend));
        }

        if self.settings_store.is_none() {
            let store = SqliteSettingsStore::new(data_dir.join("settings.db"))
                .await
                .map_err(|e| {
                    Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
                })?;
            self.settings_store = Some(Arc::new(store));
        }

        self.data_dir = Some(data_dir);
        self.build()
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The app base URL is missing or malformed
    /// - Required bridges are missing (ResourceBackend, SettingsStore)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let raw_base = self.app_base_url.ok_or_else(|| {
            Error::Config("App base URL is required. Use .app_base_url() to set it.".to_string())
        })?;

        let app_base_url = Url::parse(&raw_base)
            .map_err(|e| Error::Config(format!("Invalid app base URL '{}': {}", raw_base, e)))?;

        let resource_backend = self
            .resource_backend
            .ok_or_else(resource_backend_missing_error)?;

        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            app_base_url,
            proxy_prefix: self
                .proxy_prefix
                .unwrap_or_else(|| DEFAULT_PROXY_PREFIX.to_string()),
            shell_cache_version: self
                .shell_cache_version
                .unwrap_or(DEFAULT_SHELL_CACHE_VERSION),
            media_cache_version: self
                .media_cache_version
                .unwrap_or(DEFAULT_MEDIA_CACHE_VERSION),
            resource_manifest: self
                .resource_manifest
                .unwrap_or_else(|| owned(DEFAULT_RESOURCE_MANIFEST)),
            media_extensions: self
                .media_extensions
                .unwrap_or_else(|| owned(DEFAULT_MEDIA_EXTENSIONS)),
            media_path_patterns: self
                .media_path_patterns
                .unwrap_or_else(|| owned(DEFAULT_MEDIA_PATH_PATTERNS)),
            scroll_debounce: self.scroll_debounce.unwrap_or(DEFAULT_SCROLL_DEBOUNCE),
            seek_step: self.seek_step.unwrap_or(DEFAULT_SEEK_STEP),
            recitation_keys: self
                .recitation_keys
                .unwrap_or_else(|| owned(DEFAULT_RECITATION_KEYS)),
            command_queue_capacity: self
                .command_queue_capacity
                .unwrap_or(DEFAULT_COMMAND_QUEUE_CAPACITY),
            data_dir: self.data_dir,
            http_client,
            resource_backend,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::storage::CachedResponse;

    // Inert implementations; the builder never calls them.
    struct NullHttpClient;

    #[async_trait]
    impl HttpClient for NullHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(204, ""))
        }
    }

    struct NullBackend;

    #[async_trait]
    impl ResourceBackend for NullBackend {
        async fn list_namespaces(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn open_namespace(&self, _namespace: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn put(
            &self,
            _namespace: &str,
            _key: &str,
            _response: CachedResponse,
        ) -> BridgeResult<()> {
            Ok(())
        }

        async fn get(&self, _namespace: &str, _key: &str) -> BridgeResult<Option<CachedResponse>> {
            Ok(None)
        }

        async fn delete(&self, _namespace: &str, _key: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn delete_namespace(&self, _namespace: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn keys(&self, _namespace: &str) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NullSettingsStore;

    #[async_trait]
    impl SettingsStore for NullSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> BridgeResult<Option<bool>> {
            Ok(None)
        }

        async fn set_i64(&self, _key: &str, _value: i64) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_i64(&self, _key: &str) -> BridgeResult<Option<i64>> {
            Ok(None)
        }

        async fn set_f64(&self, _key: &str, _value: f64) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_f64(&self, _key: &str) -> BridgeResult<Option<f64>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .app_base_url("https://dua.example/app/")
            .http_client(Arc::new(NullHttpClient))
            .resource_backend(Arc::new(NullBackend))
            .settings_store(Arc::new(NullSettingsStore))
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.app_base_url.as_str(), "https://dua.example/app/");
        assert_eq!(config.proxy_prefix, DEFAULT_PROXY_PREFIX);
        assert_eq!(config.shell_namespace(), "app-shell-v4");
        assert_eq!(config.media_namespace(), "media-v1");
        assert_eq!(config.resource_manifest.len(), DEFAULT_RESOURCE_MANIFEST.len());
        assert_eq!(config.resource_manifest[0], "./");
        assert_eq!(config.scroll_debounce, Duration::from_millis(250));
        assert_eq!(config.seek_step, Duration::from_secs(5));
        assert_eq!(
            config.recitation_keys,
            vec!["ashura", "ahd", "tawassul", "kumayl", "sabah"]
        );
        assert!(config.media_extensions.contains(&".mp3".to_string()));
    }

    #[test]
    fn test_builder_requires_app_base_url() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NullHttpClient))
            .resource_backend(Arc::new(NullBackend))
            .settings_store(Arc::new(NullSettingsStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("App base URL is required"));
    }

    #[test]
    fn test_builder_rejects_malformed_base_url() {
        let err = complete_builder()
            .app_base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = complete_builder()
            .app_base_url("file:///srv/app/")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must be http(s)"));
    }

    #[test]
    fn test_builder_requires_resource_backend() {
        let result = CoreConfig::builder()
            .app_base_url("https://dua.example/")
            .http_client(Arc::new(NullHttpClient))
            .settings_store(Arc::new(NullSettingsStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("ResourceBackend"));
        assert!(err_msg.contains("offline cache"));
    }

    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .app_base_url("https://dua.example/")
            .http_client(Arc::new(NullHttpClient))
            .resource_backend(Arc::new(NullBackend))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SettingsStore"));
        assert!(err_msg.contains("user preferences"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_shims() {
        let result = CoreConfig::builder()
            .app_base_url("https://dua.example/")
            .resource_backend(Arc::new(NullBackend))
            .settings_store(Arc::new(NullSettingsStore))
            .build();

        assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
    }

    #[test]
    fn test_custom_values() {
        let config = complete_builder()
            .proxy_prefix("https://proxy.example/fetch?url=")
            .shell_cache_version(5)
            .media_cache_version(2)
            .resource_manifest(["./", "./index.html"])
            .media_extensions([".MP3"])
            .media_path_patterns(["/recitations/"])
            .scroll_debounce(Duration::from_millis(400))
            .seek_step(Duration::from_secs(10))
            .recitation_keys(["kumayl"])
            .command_queue_capacity(8)
            .build()
            .unwrap();

        assert_eq!(config.shell_namespace(), "app-shell-v5");
        assert_eq!(config.media_namespace(), "media-v2");
        assert_eq!(config.media_extensions, vec![".mp3"]);
        assert_eq!(config.resource_manifest, vec!["./", "./index.html"]);
        assert_eq!(config.command_queue_capacity, 8);
    }

    #[test]
    fn test_validate_rejects_empty_manifest() {
        let result = complete_builder()
            .resource_manifest(Vec::<String>::new())
            .build();

        assert!(result.unwrap_err().to_string().contains("manifest"));
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let result = complete_builder().media_extensions(["mp3"]).build();
        assert!(result.unwrap_err().to_string().contains("must start with '.'"));
    }

    #[test]
    fn test_validate_rejects_relative_proxy() {
        let result = complete_builder().proxy_prefix("/proxy?").build();
        assert!(result.unwrap_err().to_string().contains("Proxy prefix"));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(complete_builder()
            .scroll_debounce(Duration::ZERO)
            .build()
            .is_err());
        assert!(complete_builder().seek_step(Duration::ZERO).build().is_err());
        assert!(complete_builder().command_queue_capacity(0).build().is_err());
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = complete_builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.shell_namespace(), config.shell_namespace());
        let debug = format!("{:?}", cloned);
        assert!(debug.contains("shell_cache_version: 4"));
        assert!(debug.contains("ResourceBackend { ... }"));
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_build_with_desktop_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = CoreConfig::builder()
            .app_base_url("https://dua.example/")
            .data_dir(dir.path())
            .build_with_desktop_defaults()
            .await
            .expect("desktop defaults should succeed");

        config
            .settings_store
            .set_string("lastViewedPrayer", "kumayl")
            .await
            .unwrap();
        assert_eq!(
            config
                .settings_store
                .get_string("lastViewedPrayer")
                .await
                .unwrap()
                .as_deref(),
            Some("kumayl")
        );
        assert!(dir.path().join("cache.db").exists());
    }
}
