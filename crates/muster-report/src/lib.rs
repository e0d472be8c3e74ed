//! Report rendering for the Muster session register.
//!
//! Two stateless entry points over a record sequence:
//!
//! - [`render_table`] — delimited-text export in the declared column order.
//! - [`render_document`] — a single-file WordprocessingML document with a
//!   summary block, per-record detail, and embedded artifacts.
//!
//! Both are deterministic given the same input: the generation timestamp is
//! injected through [`ReportMeta`], never read from the clock.

pub mod document;
pub mod media;
pub mod table;

use chrono::{DateTime, Utc};
use muster_core::store::SessionStore;

pub use document::render_document;
pub use table::render_table;

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Header metadata for the document renderer.
#[derive(Debug, Clone)]
pub struct ReportMeta {
  /// Document title, e.g. the school name.
  pub title:        String,
  /// Human-readable description of the active filters
  /// (see [`muster_core::filter::describe`]).
  pub filter:       String,
  /// Pinned generation timestamp. Supplied by the caller so the same input
  /// renders to the same bytes.
  pub generated_at: DateTime<Utc>,
}

// ─── Warnings ────────────────────────────────────────────────────────────────

/// A non-fatal artifact embedding failure. Emitted inline in the document
/// and collected on the return value; never aborts the render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
  /// Position of the affected record in the rendered sequence.
  pub ordinal:  usize,
  pub artifact: String,
  pub reason:   String,
}

impl std::fmt::Display for RenderWarning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "record {}: could not embed {}: {}",
      self.ordinal, self.artifact, self.reason
    )
  }
}

/// A rendered document plus the warnings raised along the way.
#[derive(Debug, Clone)]
pub struct Rendered {
  pub bytes:    Vec<u8>,
  pub warnings: Vec<RenderWarning>,
}

// ─── Artifact access ─────────────────────────────────────────────────────────

/// Resolves stored artifact refs to bytes for embedding.
///
/// Stores are adapted through [`StoreArtifacts`]; tests substitute an
/// in-memory map so the renderer stays free of real storage.
pub trait ArtifactSource {
  fn read(&self, artifact_ref: &str) -> std::io::Result<Vec<u8>>;
}

/// Adapter exposing a [`SessionStore`]'s artifact bucket as an
/// [`ArtifactSource`].
pub struct StoreArtifacts<'a, S: SessionStore>(pub &'a S);

impl<S: SessionStore> ArtifactSource for StoreArtifacts<'_, S> {
  fn read(&self, artifact_ref: &str) -> std::io::Result<Vec<u8>> {
    self
      .0
      .read_artifact(artifact_ref)
      .map_err(|e| std::io::Error::other(e.to_string()))
  }
}
