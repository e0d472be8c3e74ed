//! Best-effort mirror of the durable table file to a GitHub repository.
//!
//! Upload-or-update of a single file through the contents API: probe the
//! remote path for its current blob sha (404 means "create"), then PUT the
//! new content. The mirror is never authoritative — a failure here is
//! reported to the caller and must never block or roll back a local write.

pub mod client;
pub mod error;

pub use client::{MirrorClient, MirrorConfig, MirrorOutcome};
pub use error::{Error, Result};
