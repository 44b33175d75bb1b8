//! # Bridge Traits
//!
//! Service seams for the media mirror core. Each trait abstracts one
//! external collaborator so the sync engine stays testable and portable:
//!
//! - [`http::HttpClient`]: HTTP transport for provider connectors
//! - [`remote::RemoteTree`]: remote file-tree listing and download
//! - [`store::ObjectStore`]: the derived artifact store
//! - [`queue::WorkQueue`]: the durable work queue
//! - [`transcode::TranscodeService`]: adaptive-bitrate transcode submission
//! - [`settings::SettingsStore`]: durable key-value configuration

pub mod error;
pub mod http;
pub mod queue;
pub mod remote;
pub mod settings;
pub mod store;
pub mod transcode;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use queue::{QueueMessage, WorkQueue};
pub use remote::{ListPage, RemoteEntry, RemoteEntryKind, RemoteTree};
pub use settings::SettingsStore;
pub use store::{ObjectStore, IMMUTABLE_CACHE_CONTROL};
pub use transcode::{
    AudioRendition, RenditionSpec, TranscodeJob, TranscodeService, VideoRendition,
};
