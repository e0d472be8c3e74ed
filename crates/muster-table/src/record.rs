//! Conversions between [`SessionRecord`] and the plain-text row
//! representation stored in the table file.
//!
//! Dates are ISO-8601 (`%Y-%m-%d`), times are `%H:%M`, the sheet list is
//! `;`-joined inside one field, and the ratio column is a two-decimal
//! display cache that is written on every encode and ignored on decode.
//!
//! Decoding is deliberately lenient: a row is never dropped. Absent columns
//! (older, narrower tables) and unparseable values decode to their defaults,
//! with the original date value replaced by the `unknown` sentinel.

use std::str::FromStr as _;

use chrono::{NaiveDate, NaiveTime};
use muster_core::{
  record::{Grade, SessionRecord},
  schema::{COLUMNS, SHEET_SEPARATOR, UNKNOWN_DATE},
};

use crate::Table;

// ─── Encoding ────────────────────────────────────────────────────────────────

pub fn encode_date(date: Option<NaiveDate>) -> String {
  match date {
    Some(d) => d.format("%Y-%m-%d").to_string(),
    None    => UNKNOWN_DATE.to_string(),
  }
}

pub fn encode_time(time: Option<NaiveTime>) -> String {
  time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

/// One row in declared column order, ratio recomputed last.
pub fn encode_record(record: &SessionRecord) -> Vec<String> {
  vec![
    encode_date(record.date),
    record.grade.map(|g| g.to_string()).unwrap_or_default(),
    record.subject.clone(),
    record.theme.clone(),
    encode_time(record.start_time),
    encode_time(record.end_time),
    record.invited_count.to_string(),
    record.attended_count.to_string(),
    record.facilitator.clone(),
    record.photo_ref.clone().unwrap_or_default(),
    record.sheet_refs.join(&SHEET_SEPARATOR.to_string()),
    format!("{:.2}", record.attendance_ratio()),
  ]
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Maps each canonical column to its index in an actual table header, so an
/// older table with fewer (or reordered) columns still decodes.
pub struct HeaderMap {
  indices: Vec<Option<usize>>,
}

impl HeaderMap {
  pub fn new(table: &Table) -> Self {
    let indices = COLUMNS.iter().map(|name| table.column(name)).collect();
    Self { indices }
  }

  /// The raw value of canonical column `col` in `row`, defaulted to `""`
  /// when the column or the field is absent.
  fn field<'r>(&self, row: &'r [String], col: usize) -> &'r str {
    self.indices[col]
      .and_then(|i| row.get(i))
      .map(String::as_str)
      .unwrap_or("")
  }
}

fn decode_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() || raw == UNKNOWN_DATE {
    return None;
  }
  match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    Ok(d) => Some(d),
    Err(_) => {
      tracing::warn!(value = raw, "unparseable date retained as unknown");
      None
    }
  }
}

fn decode_time(raw: &str) -> Option<NaiveTime> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  NaiveTime::parse_from_str(raw, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    .ok()
}

fn decode_count(raw: &str) -> u32 {
  raw.trim().parse().unwrap_or(0)
}

/// Decode one row. Never fails — a malformed field decodes to its default
/// rather than losing the row.
pub fn decode_row(map: &HeaderMap, row: &[String]) -> SessionRecord {
  let sheet_field = map.field(row, 10);
  let sheet_refs = sheet_field
    .split(SHEET_SEPARATOR)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect();

  let photo = map.field(row, 9);

  SessionRecord {
    date:           decode_date(map.field(row, 0)),
    grade:          Grade::from_str(map.field(row, 1).trim()).ok(),
    subject:        map.field(row, 2).to_string(),
    theme:          map.field(row, 3).to_string(),
    start_time:     decode_time(map.field(row, 4)),
    end_time:       decode_time(map.field(row, 5)),
    invited_count:  decode_count(map.field(row, 6)),
    attended_count: decode_count(map.field(row, 7)),
    facilitator:    map.field(row, 8).to_string(),
    photo_ref:      (!photo.is_empty()).then(|| photo.to_string()),
    sheet_refs,
    // the `ratio` column (11) is a display cache and is never read back
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
