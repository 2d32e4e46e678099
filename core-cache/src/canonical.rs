//! # URL Canonicalization
//!
//! Cross-origin audio is fetched through a public CORS proxy, so the same
//! recording can be named by two strings: the original URL and the proxied
//! one. Every cache read and write goes through [`UrlCanonicalizer`] so that
//! exactly one of them is ever used as a storage key.
//!
//! | Input                              | Canonical form                         |
//! |------------------------------------|----------------------------------------|
//! | `./index.js` (relative)            | resolved against the app base URL      |
//! | `https://app.origin/x` (same-origin) | unchanged (normalized)               |
//! | `https://cdn.other/a.mp3`          | `<proxy_prefix><percent-encoded URL>`  |
//! | `<proxy_prefix>...` (proxied)      | unchanged                              |

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use url::{ParseError, Url};

/// Deterministic `original -> proxied` mapping.
#[derive(Debug, Clone)]
pub struct UrlCanonicalizer {
    base: Url,
    proxy_prefix: String,
}

impl UrlCanonicalizer {
    pub fn new(base: Url, proxy_prefix: impl Into<String>) -> Self {
        Self {
            base,
            proxy_prefix: proxy_prefix.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.app_base_url.clone(), config.proxy_prefix.clone())
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves `raw` against the app base URL without proxying.
    pub fn resolve(&self, raw: &str) -> Result<Url> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CacheError::InvalidUrl {
                url: raw.to_string(),
                reason: "empty URL".to_string(),
            });
        }

        match Url::parse(trimmed) {
            Ok(url) => Ok(url),
            Err(ParseError::RelativeUrlWithoutBase) => {
                self.base.join(trimmed).map_err(|e| CacheError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(CacheError::InvalidUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Returns the single key under which `raw` is stored and fetched.
    ///
    /// Idempotent: canonicalizing a canonical key returns it unchanged.
    pub fn canonicalize(&self, raw: &str) -> Result<String> {
        let trimmed = raw.trim();
        if self.is_proxied(trimmed) {
            return Ok(trimmed.to_string());
        }

        let url = self.resolve(trimmed)?;
        if !is_http(&url) || url.origin() == self.base.origin() {
            return Ok(url.into());
        }

        Ok(format!(
            "{}{}",
            self.proxy_prefix,
            urlencoding::encode(url.as_str())
        ))
    }

    /// Recovers the original URL behind a proxied key.
    ///
    /// Returns `None` when `canonical` was not produced by proxying.
    pub fn original_of(&self, canonical: &str) -> Option<String> {
        let encoded = canonical.strip_prefix(self.proxy_prefix.as_str())?;
        urlencoding::decode(encoded)
            .ok()
            .map(|decoded| decoded.into_owned())
    }

    pub fn is_proxied(&self, url: &str) -> bool {
        url.starts_with(self.proxy_prefix.as_str())
    }
}

pub(crate) fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROXY: &str = "https://corsproxy.io/?";

    fn canonicalizer() -> UrlCanonicalizer {
        UrlCanonicalizer::new(Url::parse("https://dua.example/app/").unwrap(), PROXY)
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let c = canonicalizer();
        assert_eq!(
            c.canonicalize("./index.js").unwrap(),
            "https://dua.example/app/index.js"
        );
        assert_eq!(
            c.canonicalize("data/kumayl/meta.json").unwrap(),
            "https://dua.example/app/data/kumayl/meta.json"
        );
    }

    #[test]
    fn test_same_origin_is_not_proxied() {
        let c = canonicalizer();
        assert_eq!(
            c.canonicalize("https://dua.example/audio/local.mp3").unwrap(),
            "https://dua.example/audio/local.mp3"
        );
    }

    #[test]
    fn test_cross_origin_is_proxied() {
        let c = canonicalizer();
        let key = c
            .canonicalize("https://cdn.example.org/audio/kumayl.mp3")
            .unwrap();
        assert_eq!(
            key,
            "https://corsproxy.io/?https%3A%2F%2Fcdn.example.org%2Faudio%2Fkumayl.mp3"
        );
        assert_eq!(
            c.original_of(&key).as_deref(),
            Some("https://cdn.example.org/audio/kumayl.mp3")
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent_and_deterministic() {
        let c = canonicalizer();
        for raw in [
            "./index.html",
            "https://dua.example/app/",
            "https://cdn.example.org/audio/sabah.mp3?token=1",
        ] {
            let once = c.canonicalize(raw).unwrap();
            assert_eq!(c.canonicalize(&once).unwrap(), once);
            assert_eq!(c.canonicalize(raw).unwrap(), once);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let c = canonicalizer();
        assert_eq!(
            c.canonicalize("  https://cdn.example.org/a.mp3 ").unwrap(),
            c.canonicalize("https://cdn.example.org/a.mp3").unwrap()
        );
    }

    #[test]
    fn test_non_http_schemes_are_left_alone() {
        let c = canonicalizer();
        assert_eq!(
            c.canonicalize("chrome-extension://abc/script.js").unwrap(),
            "chrome-extension://abc/script.js"
        );
    }

    #[test]
    fn test_original_of_non_proxied_is_none() {
        let c = canonicalizer();
        assert_eq!(c.original_of("https://dua.example/app/index.js"), None);
    }

    #[test]
    fn test_invalid_urls() {
        let c = canonicalizer();
        assert!(matches!(
            c.canonicalize("   "),
            Err(CacheError::InvalidUrl { .. })
        ));
        assert!(matches!(
            c.canonicalize("http://[::1"),
            Err(CacheError::InvalidUrl { .. })
        ));
    }
}
