//! [`CsvStore`] — the flat-file implementation of [`SessionStore`].

use std::{
  fs,
  path::{Path, PathBuf},
  sync::Mutex,
};

use chrono::Utc;
use muster_core::{
  Error, Result,
  record::{NewSession, SessionRecord},
  schema::COLUMNS,
  store::SessionStore,
};
use muster_table::{
  Table,
  record::{HeaderMap, decode_row, encode_record},
};
use uuid::Uuid;

const TABLE_FILE: &str = "sessions.csv";
const PHOTO_BUCKET: &str = "photos";
const SHEET_BUCKET: &str = "sheets";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A session register backed by one delimited-text file plus two artifact
/// bucket directories.
///
/// Append and delete rewrite the whole table; two racing writers are
/// last-writer-wins. The design assumes a single logical writer at a time.
pub struct CsvStore {
  data_dir:   PathBuf,
  table_path: PathBuf,
  cache:      Mutex<Cache>,
}

/// Memoised `load_all` result, keyed by a revision counter that is bumped on
/// every successful append/delete. No time-boxed expiry: invalidation is
/// exact. The counter is in-process only — an external edit of the table
/// file goes unnoticed until restart.
struct Cache {
  revision: u64,
  records:  Option<Vec<SessionRecord>>,
}

impl CsvStore {
  /// Open (or create) a store rooted at `data_dir`.
  ///
  /// Creates the table file (header only) and both artifact buckets if
  /// missing; initialisation is idempotent.
  pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
    let data_dir = data_dir.into();
    fs::create_dir_all(data_dir.join(PHOTO_BUCKET))?;
    fs::create_dir_all(data_dir.join(SHEET_BUCKET))?;

    let table_path = data_dir.join(TABLE_FILE);
    if !table_path.exists() {
      fs::write(&table_path, muster_table::serialize(&empty_table()))?;
    }

    Ok(Self {
      data_dir,
      table_path,
      cache: Mutex::new(Cache { revision: 0, records: None }),
    })
  }

  /// Path of the durable table file, for mirroring.
  pub fn table_path(&self) -> &Path {
    &self.table_path
  }

  // ── Table file I/O ──────────────────────────────────────────────────────

  fn read_table(&self) -> Result<Vec<SessionRecord>> {
    let text = fs::read_to_string(&self.table_path)?;
    let table =
      muster_table::parse(&text).map_err(|e| Error::Corrupt(e.to_string()))?;
    let map = HeaderMap::new(&table);
    Ok(table.rows.iter().map(|row| decode_row(&map, row)).collect())
  }

  fn write_table(&self, records: &[SessionRecord]) -> Result<()> {
    let mut table = empty_table();
    table.rows = records.iter().map(encode_record).collect();
    fs::write(&self.table_path, muster_table::serialize(&table))?;
    Ok(())
  }

  // ── Artifacts ───────────────────────────────────────────────────────────

  fn save_artifact(
    &self,
    bucket: &str,
    bytes: &[u8],
    original_name: &str,
  ) -> Result<String> {
    // Multiple submissions can share a calendar date, so the stored name is
    // timestamp + random suffix + the original extension.
    let ext = Path::new(original_name)
      .extension()
      .and_then(|e| e.to_str())
      .unwrap_or("bin")
      .to_ascii_lowercase();
    let name = format!(
      "{}-{}.{}",
      Utc::now().format("%Y%m%dT%H%M%S"),
      &Uuid::new_v4().simple().to_string()[..8],
      ext
    );
    let rel = format!("{bucket}/{name}");
    fs::write(self.data_dir.join(&rel), bytes)?;
    Ok(rel)
  }

  /// Best-effort removal of one owned artifact. A file that is already
  /// missing is logged and tolerated.
  fn remove_artifact(&self, artifact_ref: &str) {
    let path = self.data_dir.join(artifact_ref);
    match fs::remove_file(&path) {
      Ok(()) => tracing::debug!(artifact = artifact_ref, "artifact removed"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        tracing::debug!(artifact = artifact_ref, "artifact already missing");
      }
      Err(e) => {
        tracing::warn!(artifact = artifact_ref, error = %e, "artifact removal failed");
      }
    }
  }
}

fn empty_table() -> Table {
  Table::new(COLUMNS.iter().map(|s| s.to_string()).collect())
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for CsvStore {
  fn append(&self, input: NewSession) -> Result<usize> {
    input.validate()?;

    let mut cache = self.cache.lock().expect("store cache poisoned");

    // An unreadable or missing table is treated as empty and recreated;
    // initialisation is idempotent.
    let mut records = match self.read_table() {
      Ok(records) => records,
      Err(e) => {
        tracing::warn!(error = %e, "table unreadable, recreating as empty");
        Vec::new()
      }
    };

    records.push(input.into_record());
    self.write_table(&records)?;

    let ordinal = records.len() - 1;
    cache.revision += 1;
    cache.records = Some(records);
    Ok(ordinal)
  }

  fn load_all(&self) -> Result<Vec<SessionRecord>> {
    let mut cache = self.cache.lock().expect("store cache poisoned");
    if let Some(records) = &cache.records {
      return Ok(records.clone());
    }
    let records = self.read_table()?;
    cache.records = Some(records.clone());
    Ok(records)
  }

  fn delete(&self, ordinal: usize) -> Result<SessionRecord> {
    let mut cache = self.cache.lock().expect("store cache poisoned");

    // Re-read before acting: the caller's ordinal addresses the row
    // currently at that position, not whatever it saw on an earlier read.
    let mut records = self.read_table()?;
    if ordinal >= records.len() {
      return Err(Error::OrdinalOutOfRange { ordinal, len: records.len() });
    }

    let removed = records.remove(ordinal);
    self.write_table(&records)?;
    cache.revision += 1;
    cache.records = Some(records);
    drop(cache);

    // Cascade to owned artifacts after the rewrite has committed.
    if let Some(photo) = &removed.photo_ref {
      self.remove_artifact(photo);
    }
    for sheet in &removed.sheet_refs {
      self.remove_artifact(sheet);
    }

    Ok(removed)
  }

  fn save_photo(&self, bytes: &[u8], original_name: &str) -> Result<String> {
    self.save_artifact(PHOTO_BUCKET, bytes, original_name)
  }

  fn save_sheet(&self, bytes: &[u8], original_name: &str) -> Result<String> {
    self.save_artifact(SHEET_BUCKET, bytes, original_name)
  }

  fn read_artifact(&self, artifact_ref: &str) -> Result<Vec<u8>> {
    // Refs are store-issued relative paths; refuse anything that tries to
    // climb out of the data directory.
    if Path::new(artifact_ref)
      .components()
      .any(|c| matches!(c, std::path::Component::ParentDir))
    {
      return Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("artifact ref escapes data dir: {artifact_ref}"),
      )));
    }
    Ok(fs::read(self.data_dir.join(artifact_ref))?)
  }
}
