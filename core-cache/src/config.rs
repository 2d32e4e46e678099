//! Cache-specific view of [`CoreConfig`].

use core_runtime::config::{
    CoreConfig, DEFAULT_COMMAND_QUEUE_CAPACITY, DEFAULT_MEDIA_CACHE_VERSION,
    DEFAULT_MEDIA_EXTENSIONS, DEFAULT_MEDIA_PATH_PATTERNS, DEFAULT_PROXY_PREFIX,
    DEFAULT_RESOURCE_MANIFEST, DEFAULT_SHELL_CACHE_VERSION,
};
use url::Url;

/// Settings shared by the router, the asset controller and the worker.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Base URL the app is served from
    pub app_base_url: Url,

    /// Prefix prepended to percent-encoded cross-origin URLs
    pub proxy_prefix: String,

    /// Current shell namespace (`app-shell-v<N>`)
    pub shell_namespace: String,

    /// Current media namespace (`media-v<N>`)
    pub media_namespace: String,

    /// Ordered shell resources populated at install time
    pub resource_manifest: Vec<String>,

    /// Lowercase extensions (with leading dot) classifying a request as media
    pub media_extensions: Vec<String>,

    /// Path fragments classifying a request as media
    pub media_path_patterns: Vec<String>,

    /// Capacity of the worker command queue
    pub command_queue_capacity: usize,
}

impl CacheConfig {
    /// Defaults for everything except the base URL.
    pub fn new(app_base_url: Url) -> Self {
        Self {
            app_base_url,
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
            shell_namespace: format!("app-shell-v{}", DEFAULT_SHELL_CACHE_VERSION),
            media_namespace: format!("media-v{}", DEFAULT_MEDIA_CACHE_VERSION),
            resource_manifest: to_strings(DEFAULT_RESOURCE_MANIFEST),
            media_extensions: to_strings(DEFAULT_MEDIA_EXTENSIONS),
            media_path_patterns: to_strings(DEFAULT_MEDIA_PATH_PATTERNS),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }

    /// Namespaces that survive an activation cycle.
    pub fn current_namespaces(&self) -> Vec<String> {
        vec![self.shell_namespace.clone(), self.media_namespace.clone()]
    }

    /// Whether `url` names a media resource by extension or path pattern.
    ///
    /// Query strings and fragments are ignored; the match is case-insensitive.
    pub fn is_media_url(&self, url: &str) -> bool {
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_ascii_lowercase(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase(),
        };

        self.media_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
            || self
                .media_path_patterns
                .iter()
                .any(|pattern| path.contains(pattern.as_str()))
    }
}

impl From<&CoreConfig> for CacheConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            app_base_url: config.app_base_url.clone(),
            proxy_prefix: config.proxy_prefix.clone(),
            shell_namespace: config.shell_namespace(),
            media_namespace: config.media_namespace(),
            resource_manifest: config.resource_manifest.clone(),
            media_extensions: config
                .media_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            media_path_patterns: config.media_path_patterns.clone(),
            command_queue_capacity: config.command_queue_capacity,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::new(Url::parse("https://dua.example/app/").unwrap())
    }

    #[test]
    fn test_default_namespaces() {
        let config = config();
        assert_eq!(config.shell_namespace, "app-shell-v4");
        assert_eq!(config.media_namespace, "media-v1");
        assert_eq!(
            config.current_namespaces(),
            vec!["app-shell-v4".to_string(), "media-v1".to_string()]
        );
    }

    #[test]
    fn test_media_classification() {
        let config = config();
        assert!(config.is_media_url("https://cdn.example/recitations/kumayl.mp3"));
        assert!(config.is_media_url("https://cdn.example/recitations/KUMAYL.MP3?dl=1"));
        assert!(config.is_media_url("https://cdn.example/audio/stream?id=7"));
        assert!(!config.is_media_url("https://dua.example/app/index.js"));
        assert!(!config.is_media_url("https://dua.example/app/data/kumayl/meta.json"));
        assert!(!config.is_media_url("https://cdn.example/page?file=x.mp3"));
    }
}
