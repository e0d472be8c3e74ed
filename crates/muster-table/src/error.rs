//! Error type for `muster-table`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unterminated quoted field starting on line {line}")]
  UnterminatedQuote { line: usize },

  #[error("table has no header row")]
  MissingHeader,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
