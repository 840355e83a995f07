//! Synchronizer between the live document, the local store and the remote.
//!
//! The live document is the source of truth while running. Every committed
//! mutation goes through [`Synchronizer::update`]: apply to a draft, bump the
//! revision, write the local store, swap the draft in, then dispatch a push
//! without waiting for it.
//!
//! On startup [`Synchronizer::reconcile`] runs once: a remote document, if
//! any, replaces the local one wholesale; an empty remote is seeded from the
//! local document.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::db::LocalStore;
use crate::errors::AppError;
use crate::models::StateDocument;
use crate::remote::RemoteStore;

/// Lifecycle phase of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Reconciling,
    Steady,
}

/// Outcome of one remote operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub ok: bool,
    pub at: String,
}

impl SyncEvent {
    fn now(ok: bool) -> Self {
        Self {
            ok,
            at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone)]
struct Activity {
    phase: Phase,
    last_push: Option<SyncEvent>,
    last_pull: Option<SyncEvent>,
}

/// Snapshot of sync state for operators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub phase: Phase,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_push: Option<SyncEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pull: Option<SyncEvent>,
}

/// A mutation that reached the local store.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub revision: u64,
}

/// Owns the live State Document and replicates it.
pub struct Synchronizer {
    live: Mutex<StateDocument>,
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    activity: Arc<RwLock<Activity>>,
    default_remote_url: Option<String>,
}

impl Synchronizer {
    /// Wrap the document loaded from the local store. Starts in `Reconciling`.
    pub fn new(
        document: StateDocument,
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        default_remote_url: Option<String>,
    ) -> Self {
        Self {
            live: Mutex::new(document),
            local,
            remote,
            activity: Arc::new(RwLock::new(Activity {
                phase: Phase::Reconciling,
                last_push: None,
                last_pull: None,
            })),
            default_remote_url,
        }
    }

    pub async fn phase(&self) -> Phase {
        self.activity.read().await.phase
    }

    /// One-time startup reconciliation. Never fails: any problem leaves the
    /// local document in place and the synchronizer still becomes `Steady`.
    pub async fn reconcile(&self) -> Phase {
        let mut live = self.live.lock().await;
        let mut activity = self.activity.write().await;
        if activity.phase == Phase::Steady {
            return Phase::Steady;
        }

        match live.settings.sync_endpoint().map(str::to_string) {
            None => {
                tracing::info!("Remote sync disabled, using local state");
            }
            Some(url) => match self.remote.pull(&url).await {
                Some(mut pulled) => {
                    activity.last_pull = Some(SyncEvent::now(true));
                    pulled.fill_defaults(self.default_remote_url.as_deref());
                    match self.local.save_state(&pulled).await {
                        Ok(()) => {
                            tracing::info!(
                                revision = pulled.revision,
                                "Adopted remote state at startup"
                            );
                            *live = pulled;
                        }
                        Err(e) => {
                            tracing::warn!("Could not store remote state, keeping local: {}", e);
                        }
                    }
                }
                None => {
                    activity.last_pull = Some(SyncEvent::now(false));
                    tracing::info!("Remote has no data, seeding it from local state");
                    let ok = self.remote.push(&url, &live).await;
                    activity.last_push = Some(SyncEvent::now(ok));
                    if !ok {
                        tracing::warn!("Seeding the remote failed, continuing local-only");
                    }
                }
            },
        }

        activity.phase = Phase::Steady;
        Phase::Steady
    }

    /// Clone of the live document.
    pub async fn snapshot(&self) -> StateDocument {
        self.live.lock().await.clone()
    }

    /// Read from the live document without cloning it.
    pub async fn read<T, F>(&self, view: F) -> T
    where
        F: FnOnce(&StateDocument) -> T,
    {
        let live = self.live.lock().await;
        view(&live)
    }

    pub async fn revision(&self) -> u64 {
        self.live.lock().await.revision
    }

    /// Apply a mutation, persist it, then replicate it best-effort.
    ///
    /// An `Err` from `mutate` discards the draft and the previous state stands.
    /// The push is spawned and never awaited here.
    pub async fn update<T, F>(&self, mutate: F) -> Result<Committed<T>, AppError>
    where
        F: FnOnce(&mut StateDocument) -> Result<T, AppError>,
    {
        let mut live = self.live.lock().await;

        let mut draft = live.clone();
        let value = mutate(&mut draft)?;
        draft.revision += 1;

        self.local.save_state(&draft).await?;
        *live = draft;

        if let Some(url) = live.settings.sync_endpoint() {
            self.dispatch_push(url.to_string(), live.clone());
        }

        Ok(Committed {
            value,
            revision: live.revision,
        })
    }

    fn dispatch_push(&self, url: String, document: StateDocument) {
        let remote = Arc::clone(&self.remote);
        let activity = Arc::clone(&self.activity);
        let revision = document.revision;
        tokio::spawn(async move {
            let ok = remote.push(&url, &document).await;
            if !ok {
                tracing::warn!(revision, "Background push did not reach the remote");
            }
            activity.write().await.last_push = Some(SyncEvent::now(ok));
        });
    }

    /// Replace the local and live document with the remote copy, if it has one.
    /// Returns whether a document was adopted.
    pub async fn pull_now(&self) -> Result<bool, AppError> {
        let url = self
            .read(|doc| doc.settings.endpoint().map(str::to_string))
            .await
            .ok_or_else(|| AppError::Validation("Remote endpoint is not configured".to_string()))?;

        // No lock is held while the remote answers.
        let pulled = self.remote.pull(&url).await;
        self.activity.write().await.last_pull = Some(SyncEvent::now(pulled.is_some()));

        let Some(mut pulled) = pulled else {
            tracing::info!("Manual pull returned no data, local state kept");
            return Ok(false);
        };

        pulled.fill_defaults(self.default_remote_url.as_deref());
        let mut live = self.live.lock().await;
        self.local.save_state(&pulled).await?;
        tracing::info!(revision = pulled.revision, "Manual pull adopted remote state");
        *live = pulled;
        Ok(true)
    }

    /// Send the live document now and report whether it was delivered.
    pub async fn push_now(&self) -> Result<bool, AppError> {
        let (url, document) = {
            let live = self.live.lock().await;
            let url = live
                .settings
                .endpoint()
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::Validation("Remote endpoint is not configured".to_string())
                })?;
            (url, live.clone())
        };

        let ok = self.remote.push(&url, &document).await;
        self.activity.write().await.last_push = Some(SyncEvent::now(ok));
        tracing::info!(ok, revision = document.revision, "Manual push finished");
        Ok(ok)
    }

    pub async fn status(&self) -> SyncStatus {
        let (enabled, endpoint, revision) = self
            .read(|doc| {
                (
                    doc.settings.sync_endpoint().is_some(),
                    doc.settings.endpoint().map(str::to_string),
                    doc.revision,
                )
            })
            .await;
        let activity = self.activity.read().await.clone();

        SyncStatus {
            phase: activity.phase,
            enabled,
            endpoint,
            revision,
            last_push: activity.last_push,
            last_pull: activity.last_pull,
        }
    }
}
