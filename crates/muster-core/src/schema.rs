//! The declared column set of the durable table.
//!
//! One canonical schema with optional fields. Readers must treat a narrower
//! header (an older table) as this schema with the absent columns defaulted,
//! and must never drop a row for having too few fields.

/// Column names in declared order. `sheets` is a `;`-joined list inside one
/// field; `ratio` is a display cache recomputed on every read.
pub const COLUMNS: [&str; 12] = [
  "date",
  "grade",
  "subject",
  "theme",
  "start_time",
  "end_time",
  "invited",
  "attended",
  "facilitator",
  "photo",
  "sheets",
  "ratio",
];

/// Sentinel stored in the `date` column for rows whose original value could
/// not be parsed as a calendar date.
pub const UNKNOWN_DATE: &str = "unknown";

/// Separator between multiple sheet refs inside the `sheets` field.
pub const SHEET_SEPARATOR: char = ';';
