//! # Reader Session
//!
//! Application state of one open reader: the recitation, its text, the
//! selected narrator and the sync engine driving the verse view.
//!
//! The host forwards transport and view notifications (position updates,
//! scrolls, verse clicks, end of stream) to [`ReaderSession::engine_mut`] and
//! calls the session for anything that also touches the library or the
//! offline cache.

use crate::error::{CoreError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_cache::{CacheCommand, CacheWorkerHandle, CommandOutcome, UrlCanonicalizer};
use core_library::{Narrator, Preferences, RecitationCatalog, RecitationMeta, RecitationText};
use core_playback::{PlaybackSyncEngine, TimingLoader};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
use core_runtime::logging::redact_url_query;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

struct OpenRecitation {
    meta: RecitationMeta,
    text: Arc<RecitationText>,
    narrator: usize,
}

pub struct ReaderSession {
    catalog: Arc<RecitationCatalog>,
    preferences: Preferences,
    timing_loader: TimingLoader,
    cache: CacheWorkerHandle,
    canonicalizer: UrlCanonicalizer,
    /// Foreground client; requests are answered by the cache router.
    http_client: Arc<dyn HttpClient>,
    engine: PlaybackSyncEngine,
    event_bus: EventBus,
    current: Option<OpenRecitation>,
}

impl ReaderSession {
    pub(crate) fn new(
        catalog: Arc<RecitationCatalog>,
        preferences: Preferences,
        timing_loader: TimingLoader,
        cache: CacheWorkerHandle,
        http_client: Arc<dyn HttpClient>,
        engine: PlaybackSyncEngine,
        event_bus: EventBus,
    ) -> Self {
        let canonicalizer = cache.router().canonicalizer().clone();
        Self {
            catalog,
            preferences,
            timing_loader,
            cache,
            canonicalizer,
            http_client,
            engine,
            event_bus,
            current: None,
        }
    }

    // ========================================================================
    // Recitation & Narrator
    // ========================================================================

    /// Opens `key`: loads its text, records it as last viewed and selects
    /// the first narrator.
    #[instrument(skip(self))]
    pub async fn open(&mut self, key: &str) -> Result<()> {
        let meta = self
            .catalog
            .metadata(key)
            .ok_or_else(|| core_library::LibraryError::NotFound {
                entity_type: "recitation".to_string(),
                id: key.to_string(),
            })?;
        let text = self.catalog.load_text(key).await?;

        if let Err(e) = self.preferences.set_last_viewed(key).await {
            warn!(error = %e, "Failed to record last viewed recitation");
        }

        info!(verses = text.verse_count(), narrators = meta.reciters.len(), "Opened recitation");
        self.current = Some(OpenRecitation {
            meta,
            text,
            narrator: 0,
        });
        self.emit(CoreEvent::Library(LibraryEvent::RecitationOpened {
            key: key.to_string(),
        }));

        self.load_narrator(0).await?;
        Ok(())
    }

    /// Switches narrator. Returns whether the audio source changed.
    ///
    /// The previous timing is dropped first; if the new narrator has no
    /// usable timing the engine stays in its untimed state.
    #[instrument(skip(self))]
    pub async fn select_narrator(&mut self, index: usize) -> Result<bool> {
        self.load_narrator(index).await
    }

    async fn load_narrator(&mut self, index: usize) -> Result<bool> {
        let current = self.current.as_ref().ok_or(CoreError::NoRecitationOpen)?;
        let recitation = current.meta.key.clone();
        let narrator = current
            .meta
            .narrator(index)
            .cloned()
            .ok_or(CoreError::NarratorOutOfRange {
                index,
                available: current.meta.reciters.len(),
            })?;
        let source = self.canonicalizer.canonicalize(&narrator.audio_url)?;

        self.engine.set_timing(None);
        let timing = self
            .timing_loader
            .load(&recitation, narrator.timing_key.as_deref())
            .await;
        if timing.is_none() {
            self.emit(CoreEvent::Playback(PlaybackEvent::TimingUnavailable {
                recitation: recitation.clone(),
                narrator: narrator.display_name(index),
            }));
        }
        self.engine.set_timing(timing);

        let changed = self.engine.load_source(&source);
        if let Some(current) = self.current.as_mut() {
            current.narrator = index;
        }

        debug!(narrator = index, changed, "Narrator selected");
        Ok(changed)
    }

    // ========================================================================
    // Offline Audio
    // ========================================================================

    /// Records the "keep offline" choice for the current narrator's audio and
    /// asks the cache worker to add or evict it.
    ///
    /// The intent is persisted under the original URL; the worker derives the
    /// canonical key itself.
    #[instrument(skip(self))]
    pub async fn set_offline(&self, keep: bool) -> Result<()> {
        let url = self.current_audio_url().ok_or(CoreError::NoRecitationOpen)?;

        self.preferences.set_cache_intent(url, keep).await?;
        let command = if keep {
            CacheCommand::cache(url)
        } else {
            CacheCommand::uncache(url)
        };
        self.cache.post(command).await?;
        Ok(())
    }

    /// Whether the user asked to keep the current audio offline. May be
    /// `true` before the download finished.
    pub async fn offline_intent(&self) -> Result<bool> {
        let url = self.current_audio_url().ok_or(CoreError::NoRecitationOpen)?;
        Ok(self.preferences.cache_intent(url).await?)
    }

    /// Whether `original_url` is stored in the media namespace.
    pub async fn is_cached(&self, original_url: &str) -> Result<bool> {
        Ok(self.cache.is_cached(original_url).await?)
    }

    /// Forgets every offline intent and clears every cache namespace.
    ///
    /// The host should reload afterwards; a `ReloadRequired` event is
    /// published as well.
    #[instrument(skip(self))]
    pub async fn factory_reset(&self) -> Result<usize> {
        self.preferences.clear_cache_intents().await?;
        match self.cache.request(CacheCommand::ClearAll).await? {
            CommandOutcome::Cleared { namespaces } => Ok(namespaces),
            _ => Ok(0),
        }
    }

    /// Download size of the current audio in MiB, rounded to one decimal.
    ///
    /// Asks with `HEAD` first and falls back to `GET` when that fails. Any
    /// failure, or a missing `Content-Length`, yields `None`.
    #[instrument(skip(self))]
    pub async fn audio_size_mb(&self) -> Option<f64> {
        let url = self.current_audio_url()?;
        let canonical = match self.canonicalizer.canonicalize(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                warn!(error = %e, "Cannot size audio");
                return None;
            }
        };

        let response = match self.probe(HttpRequest::head(canonical.as_str())).await {
            Some(response) => response,
            None => {
                debug!(url = %redact_url_query(&canonical), "HEAD failed; trying GET");
                self.probe(HttpRequest::get(canonical.as_str())).await?
            }
        };

        let bytes = response.content_length()?;
        Some(((bytes as f64 / BYTES_PER_MIB) * 10.0).round() / 10.0)
    }

    async fn probe(&self, request: HttpRequest) -> Option<HttpResponse> {
        match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => Some(response),
            Ok(response) => {
                debug!(status = response.status, "Size probe rejected");
                None
            }
            Err(e) => {
                debug!(error = %e, "Size probe failed");
                None
            }
        }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Applies `rate` to playback and persists it.
    pub async fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        self.engine.set_rate(rate)?;
        self.preferences.set_playback_rate(rate).await?;
        Ok(())
    }

    /// Toggles the open recitation as a favorite. Returns the new state.
    pub async fn toggle_favorite(&self) -> Result<bool> {
        let key = self
            .current
            .as_ref()
            .map(|current| current.meta.key.clone())
            .ok_or(CoreError::NoRecitationOpen)?;

        let favorite = self.preferences.toggle_favorite(&key).await?;
        self.emit(CoreEvent::Library(LibraryEvent::FavoritesChanged { key, favorite }));
        Ok(favorite)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn recitation(&self) -> Option<&RecitationMeta> {
        self.current.as_ref().map(|current| &current.meta)
    }

    pub fn text(&self) -> Option<&RecitationText> {
        self.current.as_ref().map(|current| current.text.as_ref())
    }

    pub fn narrator_index(&self) -> Option<usize> {
        self.current.as_ref().map(|current| current.narrator)
    }

    pub fn narrator(&self) -> Option<&Narrator> {
        self.current
            .as_ref()
            .and_then(|current| current.meta.narrator(current.narrator))
    }

    /// Original (pre-proxy) URL of the current narrator's audio.
    pub fn current_audio_url(&self) -> Option<&str> {
        self.narrator().map(|narrator| narrator.audio_url.as_str())
    }

    pub fn engine(&self) -> &PlaybackSyncEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackSyncEngine {
        &mut self.engine
    }

    fn emit(&self, event: CoreEvent) {
        self.event_bus.emit(event).ok();
    }
}
