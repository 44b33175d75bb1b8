//! # Change Lister
//!
//! Wraps the remote listing API for the orchestrator: full listing on first
//! run, incremental continuation afterwards, with typed handling of the two
//! remote conditions that change control flow.
//!
//! - `path/not_found` on a full listing is a normal state for a freshly
//!   provisioned integration and yields an empty terminal page.
//! - A reset continuation cursor surfaces as [`SyncError::CursorExpired`];
//!   clearing persisted state is the cursor store's responsibility, invoked
//!   by the orchestrator, never this component's.
//!
//! Pages are returned one at a time so the caller can fully dispatch a page
//! before requesting the next; a failure mid-stream leaves the cursor at the
//! last fully processed page, not the last fetched one.

use bridge_traits::error::BridgeError;
use bridge_traits::remote::{ListPage, RemoteTree};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::path::RootMapping;

/// Remote listing wrapper.
pub struct ChangeLister {
    remote: Arc<dyn RemoteTree>,
}

impl ChangeLister {
    pub fn new(remote: Arc<dyn RemoteTree>) -> Self {
        Self { remote }
    }

    /// Perform a full listing from the mapping's resolved root.
    ///
    /// Returns an empty terminal page when the remote folder does not exist
    /// yet.
    #[instrument(skip(self, mapping), fields(api_root = %mapping.api_root))]
    pub async fn full(&self, mapping: &RootMapping, recursive: bool) -> Result<ListPage> {
        match self.remote.list_folder(&mapping.api_root, recursive).await {
            Ok(page) => {
                debug!(
                    entries = page.entries.len(),
                    has_more = page.has_more,
                    "Full listing page"
                );
                Ok(page)
            }
            Err(BridgeError::NotFound(path)) => {
                // The remote folder is created on first upload; an absent
                // folder is an empty library, not a failure.
                info!(path = %path, "Remote folder does not exist yet, treating as empty");
                Ok(ListPage::empty())
            }
            Err(e) => Err(SyncError::Provider(e.to_string())),
        }
    }

    /// Continue a listing from a previously issued cursor.
    #[instrument(skip(self, cursor))]
    pub async fn continuation(&self, cursor: &str) -> Result<ListPage> {
        match self.remote.list_folder_continue(cursor).await {
            Ok(page) => {
                debug!(
                    entries = page.entries.len(),
                    has_more = page.has_more,
                    "Continuation page"
                );
                Ok(page)
            }
            Err(BridgeError::CursorReset(msg)) => Err(SyncError::CursorExpired(msg)),
            Err(e) => Err(SyncError::Provider(e.to_string())),
        }
    }
}
