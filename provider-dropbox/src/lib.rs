//! # Dropbox Provider
//!
//! Implements the `RemoteTree` trait for the Dropbox API v2.
//!
//! ## Overview
//!
//! This module provides:
//! - Full recursive folder listing with continuation cursors
//! - Incremental change listing via `files/list_folder/continue`
//! - Content download by stable file id
//! - Temporary direct download links for streaming large files
//! - Typed mapping of `path/not_found` and cursor `reset` conditions
//! - Rate limiting and exponential backoff

pub mod connector;
pub mod error;
pub mod types;

pub use connector::DropboxConnector;
pub use error::{DropboxError, Result};
