//! RFC 4180 delimited-text parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ scan_records()   → Vec<Vec<String>>  (quote-aware record split)
//!          └─ parse()     → Table             (first record = header)
//!
//! Tolerates bare LF as well as CRLF line endings, and a missing trailing
//! newline. A quoted field may contain the delimiter, escaped quotes
//! (doubled `""`), and embedded newlines.

use crate::{Error, Result, Table};

/// Parse a full table. The first record is the header.
///
/// An empty input (or one containing only a byte-order mark) is
/// [`Error::MissingHeader`]; an input with a header and no data rows is a
/// valid empty table.
pub fn parse(input: &str) -> Result<Table> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);
  let mut records = scan_records(input)?;
  if records.is_empty() {
    return Err(Error::MissingHeader);
  }
  let header = records.remove(0);
  Ok(Table { header, rows: records })
}

// ─── Scanner ─────────────────────────────────────────────────────────────────

enum State {
  /// At the start of a field; nothing consumed yet.
  FieldStart,
  /// Inside an unquoted field.
  Unquoted,
  /// Inside a quoted field.
  Quoted,
  /// Just saw a `"` inside a quoted field — either the closer or the first
  /// half of an escaped quote.
  QuoteInQuoted,
}

fn scan_records(input: &str) -> Result<Vec<Vec<String>>> {
  let mut records: Vec<Vec<String>> = Vec::new();
  let mut record:  Vec<String>      = Vec::new();
  let mut field    = String::new();
  let mut state    = State::FieldStart;
  let mut line     = 1usize;
  let mut open_line = 1usize;

  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if c == '\n' {
      line += 1;
    }
    match state {
      State::FieldStart => match c {
        '"' => {
          state = State::Quoted;
          open_line = line;
        }
        ',' => record.push(std::mem::take(&mut field)),
        '\r' if chars.peek() == Some(&'\n') => {}
        '\n' => {
          record.push(std::mem::take(&mut field));
          flush_record(&mut records, &mut record);
        }
        _ => {
          field.push(c);
          state = State::Unquoted;
        }
      },

      State::Unquoted => match c {
        ',' => {
          record.push(std::mem::take(&mut field));
          state = State::FieldStart;
        }
        '\r' if chars.peek() == Some(&'\n') => {}
        '\n' => {
          record.push(std::mem::take(&mut field));
          flush_record(&mut records, &mut record);
          state = State::FieldStart;
        }
        _ => field.push(c),
      },

      State::Quoted => match c {
        '"' => state = State::QuoteInQuoted,
        _ => field.push(c),
      },

      State::QuoteInQuoted => match c {
        '"' => {
          field.push('"');
          state = State::Quoted;
        }
        ',' => {
          record.push(std::mem::take(&mut field));
          state = State::FieldStart;
        }
        '\r' if chars.peek() == Some(&'\n') => {}
        '\n' => {
          record.push(std::mem::take(&mut field));
          flush_record(&mut records, &mut record);
          state = State::FieldStart;
        }
        // Stray content after a closing quote; keep it rather than fail.
        _ => {
          field.push(c);
          state = State::Unquoted;
        }
      },
    }
  }

  match state {
    State::Quoted => return Err(Error::UnterminatedQuote { line: open_line }),
    State::FieldStart => {
      // Trailing newline already flushed; a dangling comma leaves an empty
      // final field pending only if the record has content.
      if !record.is_empty() {
        record.push(std::mem::take(&mut field));
        flush_record(&mut records, &mut record);
      }
    }
    State::Unquoted | State::QuoteInQuoted => {
      record.push(std::mem::take(&mut field));
      flush_record(&mut records, &mut record);
    }
  }

  Ok(records)
}

/// Push a completed record, dropping records that are entirely empty (blank
/// lines between rows).
fn flush_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>) {
  let finished = std::mem::take(record);
  if finished.len() == 1 && finished[0].is_empty() {
    return;
  }
  records.push(finished);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_and_rows() {
    let t = parse("a,b,c\n1,2,3\n4,5,6\n").unwrap();
    assert_eq!(t.header, vec!["a", "b", "c"]);
    assert_eq!(t.rows, vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]);
  }

  #[test]
  fn header_only_is_empty_table() {
    let t = parse("a,b,c\n").unwrap();
    assert!(t.rows.is_empty());
  }

  #[test]
  fn empty_input_is_missing_header() {
    assert!(matches!(parse(""), Err(Error::MissingHeader)));
  }

  #[test]
  fn crlf_line_endings() {
    let t = parse("a,b\r\n1,2\r\n").unwrap();
    assert_eq!(t.rows, vec![vec!["1", "2"]]);
  }

  #[test]
  fn missing_trailing_newline() {
    let t = parse("a,b\n1,2").unwrap();
    assert_eq!(t.rows, vec![vec!["1", "2"]]);
  }

  #[test]
  fn quoted_field_with_delimiter() {
    let t = parse("a,b\n\"x,y\",2\n").unwrap();
    assert_eq!(t.rows[0][0], "x,y");
  }

  #[test]
  fn quoted_field_with_escaped_quote() {
    let t = parse("a\n\"say \"\"hi\"\"\"\n").unwrap();
    assert_eq!(t.rows[0][0], "say \"hi\"");
  }

  #[test]
  fn quoted_field_with_embedded_newline() {
    let t = parse("a,b\n\"line1\nline2\",2\n").unwrap();
    assert_eq!(t.rows[0][0], "line1\nline2");
    assert_eq!(t.rows.len(), 1);
  }

  #[test]
  fn unterminated_quote_reports_line() {
    let err = parse("a,b\n\"oops,2\n").unwrap_err();
    assert!(matches!(err, Error::UnterminatedQuote { line: 2 }));
  }

  #[test]
  fn empty_fields_preserved() {
    let t = parse("a,b,c\n,,\n").unwrap();
    assert_eq!(t.rows, vec![vec!["", "", ""]]);
  }

  #[test]
  fn blank_lines_skipped() {
    let t = parse("a,b\n1,2\n\n3,4\n").unwrap();
    assert_eq!(t.rows.len(), 2);
  }

  #[test]
  fn ragged_rows_kept_as_is() {
    let t = parse("a,b,c\n1,2\n").unwrap();
    assert_eq!(t.rows, vec![vec!["1", "2"]]);
  }

  #[test]
  fn bom_is_stripped() {
    let t = parse("\u{feff}a,b\n1,2\n").unwrap();
    assert_eq!(t.header, vec!["a", "b"]);
  }
}
