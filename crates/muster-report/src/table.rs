//! Tabular export — the durable schema's column order with the ratio
//! recomputed per record.

use muster_core::{record::SessionRecord, schema::COLUMNS};
use muster_table::{Table, record::encode_record};

/// Render `records` as delimited text. Zero records yields header-only
/// output whose column order matches a non-empty render exactly.
pub fn render_table(records: &[SessionRecord]) -> Vec<u8> {
  let mut table = Table::new(COLUMNS.iter().map(|s| s.to_string()).collect());
  table.rows = records.iter().map(encode_record).collect();
  muster_table::serialize(&table).into_bytes()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
