#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playback::AudioTransport;
use bridge_traits::render::{VerseRenderer, VerseTiming};
use core_runtime::events::{CoreEvent, Receiver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const BASE: &str = "https://dua.example/";
pub const AUDIO_A: &str = "https://cdn.example.org/audio/kumayl-a.mp3";
pub const AUDIO_B: &str = "https://cdn.example.org/audio/kumayl-b.mp3";
pub const PROXIED_A: &str =
    "https://corsproxy.io/?https%3A%2F%2Fcdn.example.org%2Faudio%2Fkumayl-a.mp3";
pub const PROXIED_B: &str =
    "https://corsproxy.io/?https%3A%2F%2Fcdn.example.org%2Faudio%2Fkumayl-b.mp3";

// ============================================================================
// Network
// ============================================================================

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

/// Scripted network keyed by method and URL; unrouted requests are 404.
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Mutex<HashMap<(HttpMethod, String), Route>>,
    requests: Mutex<Vec<(HttpMethod, String)>>,
}

impl ScriptedHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, url: &str, status: u16, body: &str) {
        self.route(HttpMethod::Get, url, status, body, &[]);
    }

    pub fn route(
        &self,
        method: HttpMethod,
        url: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) {
        self.routes.lock().insert(
            (method, url.to_string()),
            Route {
                status,
                body: body.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
    }

    pub fn count(&self, method: HttpMethod, url: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|(m, u)| *m == method && u == url)
            .count()
    }

    /// Serves the app shell, one recitation with two narrators (only the
    /// first has timing) and both audio files.
    pub fn with_recitation(self: Arc<Self>) -> Arc<Self> {
        self.get(BASE, 200, "<html></html>");
        self.get(&format!("{}index.html", BASE), 200, "<html></html>");
        self.get(
            &format!("{}data/kumayl/meta.json", BASE),
            200,
            &format!(
                r#"{{"name":"Kumayl","icon":"🌙","reciters":[
                    {{"name":"Narrator A","audioUrl":"{}","timingKey":"a"}},
                    {{"name":"Narrator B","audioUrl":"{}","timingKey":"b"}}
                ]}}"#,
                AUDIO_A, AUDIO_B
            ),
        );
        self.get(
            &format!("{}data/kumayl/arabic.txt", BASE),
            200,
            "verse one\nverse two\nverse three\n",
        );
        self.get(
            &format!("{}data/kumayl/timings_a.json", BASE),
            200,
            "[0, 5000, 12000]",
        );
        self.get(PROXIED_A, 200, "narrator-a-audio");
        self.get(PROXIED_B, 200, "narrator-b-audio");
        self
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests
            .lock()
            .push((request.method, request.url.clone()));

        let route = self
            .routes
            .lock()
            .get(&(request.method, request.url.clone()))
            .cloned();
        match route {
            Some(route) if route.status == 0 => Err(BridgeError::OperationFailed(
                "connection reset".to_string(),
            )),
            Some(route) => Ok(route
                .headers
                .into_iter()
                .fold(HttpResponse::new(route.status, route.body), |response, (k, v)| {
                    response.with_header(k, v)
                })),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

// ============================================================================
// Foreground Collaborators
// ============================================================================

#[derive(Debug, Default)]
pub struct TransportState {
    pub source: Option<String>,
    pub position_ms: u64,
    pub rate: f64,
    pub paused: bool,
}

#[derive(Clone, Default)]
pub struct RecordingTransport(pub Arc<Mutex<TransportState>>);

impl AudioTransport for RecordingTransport {
    fn is_ready(&self) -> bool {
        self.0.lock().source.is_some()
    }

    fn duration_ms(&self) -> Option<u64> {
        Some(120_000)
    }

    fn position_ms(&self) -> u64 {
        self.0.lock().position_ms
    }

    fn set_position_ms(&mut self, position_ms: u64) {
        self.0.lock().position_ms = position_ms;
    }

    fn set_rate(&mut self, rate: f64) {
        self.0.lock().rate = rate;
    }

    fn play(&mut self) -> BridgeResult<()> {
        self.0.lock().paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.0.lock().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.0.lock().paused
    }

    fn set_source(&mut self, url: &str) {
        self.0.lock().source = Some(url.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RendererState {
    pub timings: Vec<VerseTiming>,
    pub highlighted: Option<usize>,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer(pub Arc<Mutex<RendererState>>);

impl VerseRenderer for RecordingRenderer {
    fn apply_timings(&mut self, timings: &[VerseTiming]) {
        self.0.lock().timings = timings.to_vec();
    }

    fn set_highlight(&mut self, verse: Option<usize>) {
        self.0.lock().highlighted = verse;
    }

    fn scroll_into_view(&mut self, _verse: usize) {}
}

// ============================================================================
// Events
// ============================================================================

/// Waits for the first event matching `predicate`.
pub async fn wait_for<F>(events: &mut Receiver<CoreEvent>, mut predicate: F) -> CoreEvent
where
    F: FnMut(&CoreEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {}", e),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
