//! # Core Runtime
//!
//! Shared runtime infrastructure for the media mirror core:
//!
//! - **Configuration** (`config`): tuning knobs with fail-fast validation
//! - **Events** (`events`): broadcast bus for sync lifecycle events
//! - **Logging** (`logging`): tracing subscriber setup

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{MirrorConfig, MirrorConfigBuilder, VariantPolicy};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, SyncEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
