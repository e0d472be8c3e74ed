//! Delimited-text serializer.
//!
//! Produces LF line endings and RFC 4180 quoting. Output is deterministic:
//! the same table serializes to the same bytes on every run.

use crate::Table;

/// Quote `field` only when it needs it (delimiter, quote, or newline).
pub fn escape_field(field: &str) -> String {
  let needs_quoting =
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r');
  if !needs_quoting {
    return field.to_string();
  }
  let mut out = String::with_capacity(field.len() + 2);
  out.push('"');
  for c in field.chars() {
    if c == '"' {
      out.push('"');
    }
    out.push(c);
  }
  out.push('"');
  out
}

/// Serialize one row, without the trailing newline.
pub fn write_row(fields: &[String]) -> String {
  fields
    .iter()
    .map(|f| escape_field(f))
    .collect::<Vec<_>>()
    .join(",")
}

/// Serialize a whole table, header first, one row per line.
pub fn serialize(table: &Table) -> String {
  let mut out = String::new();
  out.push_str(&write_row(&table.header));
  out.push('\n');
  for row in &table.rows {
    out.push_str(&write_row(row));
    out.push('\n');
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  fn table(header: &[&str], rows: &[&[&str]]) -> Table {
    Table {
      header: header.iter().map(|s| s.to_string()).collect(),
      rows:   rows
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect(),
    }
  }

  #[test]
  fn plain_fields_unquoted() {
    assert_eq!(escape_field("hello"), "hello");
  }

  #[test]
  fn delimiter_forces_quotes() {
    assert_eq!(escape_field("a,b"), "\"a,b\"");
  }

  #[test]
  fn quotes_are_doubled() {
    assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
  }

  #[test]
  fn newline_forces_quotes() {
    assert_eq!(escape_field("a\nb"), "\"a\nb\"");
  }

  #[test]
  fn header_only_output() {
    let t = table(&["a", "b"], &[]);
    assert_eq!(serialize(&t), "a,b\n");
  }

  #[test]
  fn round_trip_awkward_fields() {
    let t = table(
      &["name", "note"],
      &[
        &["plain", "a,b"],
        &["quoted \"x\"", "line1\nline2"],
        &["", "trailing"],
      ],
    );
    let text = serialize(&t);
    let back = parse(&text).unwrap();
    assert_eq!(back, t);
  }

  #[test]
  fn deterministic() {
    let t = table(&["a"], &[&["1"], &["2"]]);
    assert_eq!(serialize(&t), serialize(&t));
  }
}
