//! Delimited-text (comma-separated) table codec.
//!
//! The durable store, the tabular export, and the inline sheet sub-tables in
//! document rendering all speak this one format: UTF-8, a header row of
//! column names, one logical record per subsequent row, RFC 4180 quoting so
//! fields containing the delimiter, quotes, or newlines round-trip.
//!
//! `parse` and `serialize` are schema-agnostic — they move strings. The
//! [`record`] module maps rows to domain records against the declared
//! schema, defaulting absent columns.

pub mod error;
pub mod parse;
pub mod record;
pub mod serialize;

pub use error::{Error, Result};
pub use parse::parse;
pub use serialize::serialize;

/// A parsed table: the header row plus every data row, all as raw strings.
///
/// Rows are not required to have the same width as the header; readers pad
/// or truncate as their schema demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
  pub header: Vec<String>,
  pub rows:   Vec<Vec<String>>,
}

impl Table {
  pub fn new(header: Vec<String>) -> Self {
    Self { header, rows: Vec::new() }
  }

  /// Index of a named column in the header, if present.
  pub fn column(&self, name: &str) -> Option<usize> {
    self.header.iter().position(|h| h == name)
  }
}
