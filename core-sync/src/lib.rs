//! # Sync Engine
//!
//! Incremental synchronization of a remote media tree into a derived object
//! store.
//!
//! ## Overview
//!
//! This module reconciles the remote file tree against the derived artifact
//! store, decides what work each change needs, and drives that work through
//! either a direct path or a durable queue:
//!
//! - Listing remote changes via `RemoteTree` (full and incremental)
//! - Normalizing paths into canonical derived-store keys
//! - Classifying entries by media type
//! - Routing entries per the dispatch policy (inline vs queued)
//! - Producing derivatives (compressed images, preserved video originals
//!   plus transcode jobs)
//! - Advancing the durable cursor only after fully dispatched pages
//!
//! ## Components
//!
//! - **Path Normalizer** (`path`): root-mapping resolution, key
//!   normalization, media classification
//! - **Cursor Store** (`cursor`): durable single-slot change-stream position
//! - **Change Lister** (`lister`): full/incremental listing with typed
//!   not-found and cursor-expiry handling
//! - **Dispatch Policy** (`dispatch`): inline vs enqueue vs delete vs skip
//! - **Derivative Pipeline** (`pipeline`): image re-encode and two-stage
//!   video processing
//! - **Queue Consumer** (`consumer`): partial-batch settlement over the
//!   durable queue
//! - **Sync Coordinator** (`coordinator`): the orchestrating run

pub mod consumer;
pub mod coordinator;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod lister;
pub mod path;
pub mod pipeline;

pub use consumer::{BatchReport, QueueConsumer};
pub use coordinator::{SyncCoordinator, SyncRunStats};
pub use cursor::{CursorStore, SettingsCursorStore, CURSOR_KEY, FOLDER_PATH_KEY};
pub use dispatch::{Action, DispatchPolicy, Priority, WorkItem};
pub use error::{Result, SyncError};
pub use lister::ChangeLister;
pub use path::{
    derived_jpg_key, normalize, MediaType, NormalizedTarget, RootMapping, RootStyle,
};
pub use pipeline::{DerivativePipeline, PipelineConfig};
