//! Tests for the recitation catalog

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_library::{Language, LibraryError, RecitationCatalog};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

const BASE: &str = "https://dua.example/";

/// Serves fixed bodies; unknown URLs are 404, `fail` URLs error out.
#[derive(Default)]
struct StaticHttp {
    files: HashMap<String, String>,
    fail: Vec<String>,
    requests: AtomicUsize,
}

impl StaticHttp {
    fn file(mut self, path: &str, body: &str) -> Self {
        self.files.insert(format!("{}{}", BASE, path), body.to_string());
        self
    }

    fn failing(mut self, path: &str) -> Self {
        self.fail.push(format!("{}{}", BASE, path));
        self
    }
}

#[async_trait::async_trait]
impl HttpClient for StaticHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.contains(&request.url) {
            return Err(BridgeError::OperationFailed("connection refused".to_string()));
        }
        match self.files.get(&request.url) {
            Some(body) => Ok(HttpResponse::new(200, body.clone())),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

fn meta(name: &str) -> String {
    format!(
        r#"{{"name":"{}","reciters":[{{"name":"A","audioUrl":"https://cdn.example.org/{}.mp3","timingKey":"a"}}]}}"#,
        name,
        name.to_lowercase()
    )
}

fn catalog(http: StaticHttp) -> (RecitationCatalog, Arc<StaticHttp>) {
    let http = Arc::new(http);
    let catalog = RecitationCatalog::new(http.clone(), Url::parse(BASE).unwrap());
    (catalog, http)
}

#[tokio::test]
async fn test_failed_metadata_is_skipped() {
    let http = StaticHttp::default()
        .file("data/ashura/meta.json", &meta("Ashura"))
        .file("data/kumayl/meta.json", &meta("Kumayl"))
        .file("data/ahd/meta.json", "{ not json")
        .failing("data/sabah/meta.json");
    let (catalog, _) = catalog(http);

    let loaded = catalog
        .load_metadata(&["ashura", "ahd", "tawassul", "kumayl", "sabah"])
        .await;

    assert_eq!(loaded, vec!["ashura", "kumayl"]);
    let kumayl = catalog.metadata("kumayl").unwrap();
    assert_eq!(kumayl.key, "kumayl");
    assert_eq!(kumayl.reciters[0].audio_url, "https://cdn.example.org/kumayl.mp3");
}

#[tokio::test]
async fn test_menu_order_puts_last_viewed_first() {
    let http = StaticHttp::default()
        .file("data/ashura/meta.json", &meta("Ashura"))
        .file("data/ahd/meta.json", &meta("Ahd"))
        .file("data/kumayl/meta.json", &meta("Kumayl"))
        .file("data/sabah/meta.json", &meta("Sabah"));
    let (catalog, _) = catalog(http);
    catalog
        .load_metadata(&["ashura", "ahd", "kumayl", "sabah"])
        .await;

    let keys = |order: Vec<core_library::RecitationMeta>| -> Vec<String> {
        order.into_iter().map(|meta| meta.key).collect()
    };

    assert_eq!(
        keys(catalog.menu_order(Some("kumayl"))),
        vec!["kumayl", "ashura", "ahd", "sabah"]
    );
    assert_eq!(
        keys(catalog.menu_order(None)),
        vec!["ashura", "ahd", "kumayl", "sabah"]
    );
    assert_eq!(keys(catalog.search("AH")), vec!["ahd", "sabah"]);
    assert_eq!(keys(catalog.search("MAYL")), vec!["kumayl"]);
    assert!(keys(catalog.search("tawassul")).is_empty());
}

#[tokio::test]
async fn test_text_loads_available_languages_once() {
    let http = StaticHttp::default()
        .file("data/kumayl/meta.json", &meta("Kumayl"))
        .file("data/kumayl/arabic.txt", "verse one\nverse two\n\nverse three\n")
        .file("data/kumayl/farsi.txt", "one\ntwo\nthree");
    let (catalog, http) = catalog(http);
    catalog.load_metadata(&["kumayl"]).await;
    let before = http.requests.load(Ordering::SeqCst);

    let text = catalog.load_text("kumayl").await.unwrap();

    assert_eq!(text.verse_count(), 3);
    assert_eq!(text.verse(Language::Farsi, 2), Some("three"));
    assert!(!text.has(Language::English));
    assert_eq!(http.requests.load(Ordering::SeqCst), before + 3);

    let again = catalog.load_text("kumayl").await.unwrap();
    assert!(Arc::ptr_eq(&text, &again));
    assert_eq!(http.requests.load(Ordering::SeqCst), before + 3);
}

#[tokio::test]
async fn test_text_for_unknown_recitation() {
    let (catalog, _) = catalog(StaticHttp::default());

    let err = catalog.load_text("missing").await.unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));
}
