//! # Bridge Local
//!
//! Single-host implementations of the `bridge-traits` seams:
//!
//! - [`ReqwestHttpClient`]: reqwest-backed HTTP with retry/backoff
//! - [`FsObjectStore`]: filesystem-backed derived object store
//! - [`SqliteWorkQueue`]: SQLite-backed durable work queue
//! - [`SqliteSettingsStore`]: SQLite-backed settings record
//! - [`HttpTranscodeClient`]: HTTP transcode job submission

pub mod http;
pub mod object_store;
pub mod queue;
pub mod settings;
pub mod transcode;

pub use http::ReqwestHttpClient;
pub use object_store::FsObjectStore;
pub use queue::SqliteWorkQueue;
pub use settings::SqliteSettingsStore;
pub use transcode::HttpTranscodeClient;
