//! # Sync Coordinator
//!
//! Orchestrates full and incremental synchronization of the remote tree into
//! the derived store.
//!
//! ## Workflow
//!
//! ### Full sync (no stored cursor)
//! 1. Read `{folderPath, cursor}` from the settings record
//! 2. Resolve the root mapping (team root vs app root)
//! 3. List the remote tree page by page
//! 4. Normalize, classify, and dispatch every entry of a page (bounded
//!    concurrency within the page; entries are content-addressed so no
//!    per-file ordering is required)
//! 5. Persist the page's cursor only after the page is fully dispatched
//! 6. Emit lifecycle events and accumulate run statistics
//!
//! ### Incremental sync (stored cursor)
//! 1. Continue the listing from the stored cursor
//! 2. Dispatch each page and advance the cursor as above
//! 3. On cursor expiry: clear the stored cursor and restart as a full
//!    listing; expiry is never surfaced as a run failure
//!
//! Pages are strictly sequential (one in flight) because cursor advancement
//! must be ordered relative to completed dispatch; a run killed mid-page
//! simply re-processes that page on the next run. Per-file failures are
//! logged and counted, never abort the run.
//!
//! At most one run is active per coordinator; concurrent invocations get
//! `SyncError::SyncInProgress`. Serializing triggers across processes is the
//! caller's responsibility.

use bridge_traits::queue::WorkQueue;
use bridge_traits::remote::{RemoteEntry, RemoteTree};
use bridge_traits::settings::SettingsStore;
use bridge_traits::store::ObjectStore;
use core_runtime::config::MirrorConfig;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::cursor::{CursorStore, FOLDER_PATH_KEY};
use crate::dispatch::{Action, DispatchPolicy};
use crate::error::{Result, SyncError};
use crate::lister::ChangeLister;
use crate::path::RootMapping;
use crate::pipeline::DerivativePipeline;

/// Statistics accumulated over one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunStats {
    /// Listing pages fully dispatched.
    pub pages: u64,
    /// Entries reported by the listing.
    pub entries_seen: u64,
    /// Work items published to the durable queue.
    pub enqueued: u64,
    /// Work items processed inline.
    pub processed_inline: u64,
    /// Derived artifacts deleted.
    pub deleted: u64,
    /// Entries skipped (folders, non-media, unroutable).
    pub skipped: u64,
    /// Entries whose dispatch failed.
    pub failed: u64,
}

enum EntryOutcome {
    Enqueued,
    Inline,
    Deleted,
    Skipped,
    Failed,
}

/// Orchestrator for sync runs.
pub struct SyncCoordinator {
    config: MirrorConfig,
    lister: ChangeLister,
    cursor_store: Arc<dyn CursorStore>,
    settings: Arc<dyn SettingsStore>,
    store: Arc<dyn ObjectStore>,
    queue: Option<Arc<dyn WorkQueue>>,
    pipeline: Arc<DerivativePipeline>,
    policy: DispatchPolicy,
    event_bus: Arc<EventBus>,
    /// Held for the duration of a run; a second caller gets `SyncInProgress`.
    active: Mutex<()>,
}

impl SyncCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: MirrorConfig,
        remote: Arc<dyn RemoteTree>,
        settings: Arc<dyn SettingsStore>,
        cursor_store: Arc<dyn CursorStore>,
        store: Arc<dyn ObjectStore>,
        queue: Option<Arc<dyn WorkQueue>>,
        pipeline: Arc<DerivativePipeline>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let policy = DispatchPolicy::new(queue.is_some());
        Self {
            config,
            lister: ChangeLister::new(remote),
            cursor_store,
            settings,
            store,
            queue,
            pipeline,
            policy,
            event_bus,
            active: Mutex::new(()),
        }
    }

    /// Run one synchronization to completion.
    ///
    /// Full or incremental is decided by the stored cursor. Returns run
    /// statistics; per-file failures are counted, not propagated.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncRunStats> {
        let _guard = self
            .active
            .try_lock()
            .map_err(|_| SyncError::SyncInProgress)?;

        let run_id = Uuid::new_v4().to_string();
        let result = self.execute(&run_id).await;

        match &result {
            Ok(stats) => {
                info!(
                    run_id = %run_id,
                    pages = stats.pages,
                    entries = stats.entries_seen,
                    enqueued = stats.enqueued,
                    inline = stats.processed_inline,
                    deleted = stats.deleted,
                    failed = stats.failed,
                    "Sync run completed"
                );
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Completed {
                        run_id: run_id.clone(),
                        entries_seen: stats.entries_seen,
                        enqueued: stats.enqueued,
                        processed_inline: stats.processed_inline,
                        deleted: stats.deleted,
                        failed: stats.failed,
                    }))
                    .ok();
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Sync run failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::Failed {
                        run_id: run_id.clone(),
                        message: e.to_string(),
                    }))
                    .ok();
            }
        }

        result
    }

    /// Start a run on a detached task, acknowledging the trigger
    /// immediately. Failures in the detached run are only logged, never
    /// surfaced to the original caller (webhook-trigger semantics).
    pub fn run_detached(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let ceiling = Duration::from_secs(coordinator.config.sync_timeout_secs);
            match tokio::time::timeout(ceiling, coordinator.run()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!(error = %e, "Detached sync run failed"),
                Err(_) => error!(
                    timeout_secs = coordinator.config.sync_timeout_secs,
                    "Detached sync run timed out"
                ),
            }
        });
    }

    async fn execute(&self, run_id: &str) -> Result<SyncRunStats> {
        // The folder path is re-read every run; configuration may change
        // between invocations.
        let folder_path = self
            .settings
            .get_string(FOLDER_PATH_KEY)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?
            .ok_or_else(|| {
                SyncError::Config(format!("Setting {} is not configured", FOLDER_PATH_KEY))
            })?;
        let mapping = RootMapping::resolve(&folder_path)?;

        let mut cursor = self.cursor_store.load().await?;
        let full_sync = cursor.is_none();
        info!(
            run_id = %run_id,
            prefix = %mapping.derived_prefix,
            full_sync = full_sync,
            "Starting sync run"
        );
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Started {
                run_id: run_id.to_string(),
                full_sync,
            }))
            .ok();

        let mut stats = SyncRunStats::default();
        let mut reset_attempted = false;

        loop {
            let outcome = match cursor.take() {
                None => self.drain_full(run_id, &mapping, &mut stats).await,
                Some(c) => self.drain_incremental(run_id, &mapping, c, &mut stats).await,
            };

            match outcome {
                Ok(()) => return Ok(stats),
                Err(SyncError::CursorExpired(msg)) if !reset_attempted => {
                    // Controlled fallback: clear the stale cursor and redo
                    // the run as a full listing.
                    warn!(run_id = %run_id, reason = %msg, "Cursor expired, restarting as full listing");
                    self.cursor_store.clear().await?;
                    self.event_bus
                        .emit(CoreEvent::Sync(SyncEvent::CursorReset {
                            run_id: run_id.to_string(),
                        }))
                        .ok();
                    reset_attempted = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Full listing: first page from the resolved root, then continuations.
    async fn drain_full(
        &self,
        run_id: &str,
        mapping: &RootMapping,
        stats: &mut SyncRunStats,
    ) -> Result<()> {
        let mut page = self.lister.full(mapping, self.config.recursive).await?;

        loop {
            self.finish_page(run_id, mapping, &page.entries, page.cursor.as_deref(), stats)
                .await?;

            if !page.has_more {
                return Ok(());
            }
            let cursor = match &page.cursor {
                Some(c) => c.clone(),
                None => return Ok(()),
            };
            page = self.lister.continuation(&cursor).await?;
        }
    }

    /// Incremental listing: continuations from the stored cursor.
    async fn drain_incremental(
        &self,
        run_id: &str,
        mapping: &RootMapping,
        cursor: String,
        stats: &mut SyncRunStats,
    ) -> Result<()> {
        let mut cursor = cursor;

        loop {
            let page = self.lister.continuation(&cursor).await?;
            self.finish_page(run_id, mapping, &page.entries, page.cursor.as_deref(), stats)
                .await?;

            if !page.has_more {
                return Ok(());
            }
            match &page.cursor {
                Some(c) => cursor = c.clone(),
                None => return Ok(()),
            }
        }
    }

    /// Dispatch every entry of a page, then (and only then) advance the
    /// persisted cursor.
    async fn finish_page(
        &self,
        run_id: &str,
        mapping: &RootMapping,
        entries: &[RemoteEntry],
        next_cursor: Option<&str>,
        stats: &mut SyncRunStats,
    ) -> Result<()> {
        let outcomes: Vec<EntryOutcome> = stream::iter(entries.iter().cloned())
            .map(|entry: RemoteEntry| async move { self.handle_entry(&entry, mapping).await })
            .buffer_unordered(self.config.max_concurrent_dispatch)
            .collect()
            .await;

        stats.entries_seen += entries.len() as u64;
        for outcome in outcomes {
            match outcome {
                EntryOutcome::Enqueued => stats.enqueued += 1,
                EntryOutcome::Inline => stats.processed_inline += 1,
                EntryOutcome::Deleted => stats.deleted += 1,
                EntryOutcome::Skipped => stats.skipped += 1,
                EntryOutcome::Failed => stats.failed += 1,
            }
        }

        if let Some(cursor) = next_cursor {
            self.cursor_store.save(cursor).await?;
        }
        stats.pages += 1;

        debug!(
            run_id = %run_id,
            page = stats.pages,
            entries = entries.len(),
            "Page fully dispatched"
        );
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::PageCompleted {
                run_id: run_id.to_string(),
                page: stats.pages,
                entries: entries.len() as u64,
            }))
            .ok();

        Ok(())
    }

    /// Route one entry. Failures are logged and counted; the batch continues.
    async fn handle_entry(&self, entry: &RemoteEntry, mapping: &RootMapping) -> EntryOutcome {
        match self.policy.decide(entry, mapping) {
            Action::Skip => EntryOutcome::Skipped,

            Action::DeleteDerived { derived_key } => {
                match self.store.delete(&derived_key).await {
                    Ok(()) => {
                        info!(key = %derived_key, "Deleted derived artifact");
                        EntryOutcome::Deleted
                    }
                    Err(e) => {
                        error!(key = %derived_key, error = %e, "Failed to delete derived artifact");
                        EntryOutcome::Failed
                    }
                }
            }

            Action::Enqueue(mut item) => {
                let Some(queue) = &self.queue else {
                    error!(key = %item.derived_key, "Enqueue decided without a queue handle");
                    return EntryOutcome::Failed;
                };

                item.timestamp = Some(chrono::Utc::now().to_rfc3339());
                let body = match serde_json::to_string(&item) {
                    Ok(body) => body,
                    Err(e) => {
                        error!(key = %item.derived_key, error = %e, "Failed to serialize work item");
                        return EntryOutcome::Failed;
                    }
                };

                match queue.send(body).await {
                    Ok(()) => {
                        debug!(key = %item.derived_key, "Enqueued work item");
                        EntryOutcome::Enqueued
                    }
                    Err(e) => {
                        error!(key = %item.derived_key, error = %e, "Failed to enqueue work item");
                        EntryOutcome::Failed
                    }
                }
            }

            Action::ProcessInline(item) => match self.pipeline.process(&item).await {
                Ok(()) => {
                    debug!(key = %item.derived_key, "Processed inline");
                    EntryOutcome::Inline
                }
                Err(e) => {
                    // One bad file never aborts the batch.
                    error!(key = %item.derived_key, error = %e, "Inline processing failed");
                    EntryOutcome::Failed
                }
            },
        }
    }
}
