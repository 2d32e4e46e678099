//! # Cache Worker
//!
//! The long-lived background context of the offline cache. It owns the
//! strategy router and the asset controller, consumes [`CacheCommand`]s from
//! a bounded queue and publishes outcomes on the [`EventBus`].
//!
//! Foreground views talk to it through cloneable [`CacheWorkerHandle`]s:
//!
//! - [`post`](CacheWorkerHandle::post) / [`post_json`](CacheWorkerHandle::post_json)
//!   are fire-and-forget; results arrive as events.
//! - [`request`](CacheWorkerHandle::request) waits for the outcome.
//! - [`fetch`](CacheWorkerHandle::fetch) answers an intercepted request
//!   directly through the router; fetches do not queue behind commands.
//!
//! The worker stops once every handle is dropped or
//! [`shutdown`](CacheWorkerHandle::shutdown) is requested, after in-flight
//! commands have finished.

use crate::assets::SelectiveAssetController;
use crate::command::{CacheCommand, CommandOutcome};
use crate::error::{CacheError, Result};
use crate::router::CacheStrategyRouter;
use bridge_traits::http::{HttpRequest, HttpResponse};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use core_runtime::logging::redact_url_query;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

type Reply = oneshot::Sender<Result<CommandOutcome>>;

enum WorkerMessage {
    Command {
        id: Uuid,
        command: CacheCommand,
        reply: Option<Reply>,
    },
    Shutdown,
}

pub struct CacheWorker {
    router: Arc<CacheStrategyRouter>,
    assets: SelectiveAssetController,
    event_bus: EventBus,
    receiver: mpsc::Receiver<WorkerMessage>,
}

/// Cloneable sender side of the worker queue.
#[derive(Clone)]
pub struct CacheWorkerHandle {
    sender: mpsc::Sender<WorkerMessage>,
    router: Arc<CacheStrategyRouter>,
    assets: SelectiveAssetController,
}

impl CacheWorker {
    /// Creates the worker and its first handle. `capacity` bounds the queue.
    pub fn new(
        router: Arc<CacheStrategyRouter>,
        assets: SelectiveAssetController,
        event_bus: EventBus,
        capacity: usize,
    ) -> (Self, CacheWorkerHandle) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = CacheWorkerHandle {
            sender,
            router: router.clone(),
            assets: assets.clone(),
        };
        let worker = Self {
            router,
            assets,
            event_bus,
            receiver,
        };
        (worker, handle)
    }

    /// Runs the worker on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Cache worker started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(WorkerMessage::Command { id, command, reply }) => {
                        self.dispatch(id, command, reply, &mut in_flight).await;
                    }
                    Some(WorkerMessage::Shutdown) | None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Cache command task failed");
                    }
                }
            }
        }

        drain(&mut in_flight).await;
        info!("Cache worker stopped");
    }

    async fn dispatch(
        &self,
        id: Uuid,
        command: CacheCommand,
        reply: Option<Reply>,
        in_flight: &mut JoinSet<()>,
    ) {
        let span = tracing::info_span!("cache_command", %id, action = command.action());
        debug!(parent: &span, "Processing cache command");

        match command {
            CacheCommand::CacheAsset { url, cache } => {
                // Ticket order is fixed here, in queue order.
                let work = self.assets.schedule(&url, cache);
                let event_bus = self.event_bus.clone();
                in_flight.spawn(
                    async move {
                        let result = work.await;
                        publish_asset_outcome(&event_bus, &url, &result);
                        respond(reply, result);
                    }
                    .instrument(span),
                );
            }
            CacheCommand::ClearAll => {
                // Everything posted before the clear finishes first, and
                // nothing posted after it starts until it is done.
                drain(in_flight).await;
                let result = self
                    .assets
                    .clear_all()
                    .instrument(span)
                    .await
                    .map(|namespaces| CommandOutcome::Cleared { namespaces });

                match &result {
                    Ok(CommandOutcome::Cleared { namespaces }) => {
                        info!(namespaces, "All caches cleared");
                        self.emit(CacheEvent::CacheCleared {
                            namespaces: *namespaces,
                        });
                        self.emit(CacheEvent::ReloadRequired);
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Failed to clear caches"),
                }
                respond(reply, result);
            }
            CacheCommand::SkipWaiting => {
                let router = self.router.clone();
                in_flight.spawn(
                    async move {
                        let result = router.skip_waiting().await.map(CommandOutcome::Lifecycle);
                        if let Err(e) = &result {
                            warn!(error = %e, "Skip waiting failed");
                        }
                        respond(reply, result);
                    }
                    .instrument(span),
                );
            }
        }
    }

    fn emit(&self, event: CacheEvent) {
        self.event_bus.emit(CoreEvent::Cache(event)).ok();
    }
}

impl CacheWorkerHandle {
    /// Queues `command` without waiting for its outcome.
    pub async fn post(&self, command: CacheCommand) -> Result<()> {
        self.send(command, None).await
    }

    /// Parses a wire message and queues it.
    pub async fn post_json(&self, message: &str) -> Result<()> {
        self.post(CacheCommand::from_json(message)?).await
    }

    /// Queues `command` and waits until the worker has processed it.
    pub async fn request(&self, command: CacheCommand) -> Result<CommandOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.send(command, Some(reply)).await?;
        outcome.await.map_err(|_| CacheError::WorkerStopped)?
    }

    /// Answers an intercepted request through the strategy router.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.router.handle_fetch(request).await
    }

    /// Whether the asset behind `original_url` is available offline.
    pub async fn is_cached(&self, original_url: &str) -> Result<bool> {
        self.assets.is_cached(original_url).await
    }

    pub fn router(&self) -> &Arc<CacheStrategyRouter> {
        &self.router
    }

    /// Asks the worker to stop after in-flight commands finish.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(WorkerMessage::Shutdown)
            .await
            .map_err(|_| CacheError::WorkerStopped)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: CacheCommand, reply: Option<Reply>) -> Result<()> {
        let id = Uuid::new_v4();
        debug!(%id, action = command.action(), "Posting cache command");
        self.sender
            .send(WorkerMessage::Command { id, command, reply })
            .await
            .map_err(|_| CacheError::WorkerStopped)
    }
}

fn publish_asset_outcome(event_bus: &EventBus, url: &str, result: &Result<CommandOutcome>) {
    let event = match result {
        Ok(CommandOutcome::Cached { canonical_key, .. }) => CacheEvent::AssetCached {
            url: url.to_string(),
            canonical_key: canonical_key.clone(),
        },
        Ok(CommandOutcome::Evicted { canonical_key, .. }) => CacheEvent::AssetEvicted {
            url: url.to_string(),
            canonical_key: canonical_key.clone(),
        },
        Ok(_) => return,
        Err(e) => {
            error!(url = %redact_url_query(url), error = %e, "Failed to cache audio");
            CacheEvent::AssetCacheFailed {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    };
    event_bus.emit(CoreEvent::Cache(event)).ok();
}

fn respond(reply: Option<Reply>, result: Result<CommandOutcome>) {
    if let Some(reply) = reply {
        // The requester may have given up waiting.
        let _ = reply.send(result);
    }
}

async fn drain(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Cache command task failed");
        }
    }
}
