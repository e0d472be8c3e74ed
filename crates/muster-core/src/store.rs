//! The `SessionStore` trait — the seam between storage backends and the
//! API/CLI layers.
//!
//! The store owns the durable table and the artifact buckets exclusively; no
//! other component may open or rewrite them. All operations are synchronous
//! and run to completion — mirroring to a remote host happens outside the
//! store and never blocks or rolls back a local write.

use crate::{
  Result,
  record::{NewSession, SessionRecord},
};

/// Abstraction over a Muster session register backend.
///
/// Record identity is the ordinal position in the table. Deletion shifts all
/// subsequent ordinals down by one, so callers holding ordinals from an
/// earlier read must re-resolve them before acting.
///
/// The design assumes a single logical writer at a time: `append` and
/// `delete` rewrite the whole table, and two racing writers are
/// last-writer-wins. This is a declared limitation, not a defect to paper
/// over with locking.
pub trait SessionStore: Send + Sync {
  /// Validate `input` and append it to the end of the table.
  ///
  /// Returns the new record's ordinal. A missing or unreadable table is
  /// treated as empty and recreated — table initialisation is idempotent.
  /// On a validation error nothing is persisted.
  fn append(&self, input: NewSession) -> Result<usize>;

  /// Read every record in insertion order. Rows with unparseable dates are
  /// retained with `date = None`, never dropped.
  fn load_all(&self) -> Result<Vec<SessionRecord>>;

  /// Remove the record currently at `ordinal`, rewrite the table, and delete
  /// the record's owned artifact files (a file that is already missing is
  /// logged, not an error). Returns the removed record.
  ///
  /// An out-of-range ordinal is an [`crate::Error::OrdinalOutOfRange`].
  fn delete(&self, ordinal: usize) -> Result<SessionRecord>;

  /// Persist an uploaded photo into the photo bucket under a
  /// collision-resistant name and return the relative ref for
  /// [`NewSession::photo_ref`].
  fn save_photo(&self, bytes: &[u8], original_name: &str) -> Result<String>;

  /// Persist an uploaded attendance sheet into the sheet bucket and return
  /// the relative ref for [`NewSession::sheet_refs`].
  fn save_sheet(&self, bytes: &[u8], original_name: &str) -> Result<String>;

  /// Resolve a stored artifact ref to readable bytes, for report rendering.
  fn read_artifact(&self, artifact_ref: &str) -> Result<Vec<u8>>;
}
