//! Error types for `muster-core`.
//!
//! One taxonomy covers the whole system: validation failures are recovered
//! at the submission boundary, not-found failures at the deletion boundary,
//! and IO failures abort only the operation in progress.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("required field is empty: {0}")]
  MissingField(&'static str),

  #[error("invited count must be at least 1")]
  NoInvitees,

  #[error("attended count {attended} exceeds invited count {invited}")]
  AttendanceExceedsInvited { attended: u32, invited: u32 },

  #[error("start time {start} is not before end time {end}")]
  TimeOrder {
    start: chrono::NaiveTime,
    end:   chrono::NaiveTime,
  },

  #[error("no record at ordinal {ordinal} (table has {len} rows)")]
  OrdinalOutOfRange { ordinal: usize, len: usize },

  #[error("table is corrupt: {0}")]
  Corrupt(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// True for the constraint violations raised by
  /// [`crate::record::NewSession::validate`].
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField(_)
        | Self::NoInvitees
        | Self::AttendanceExceedsInvited { .. }
        | Self::TimeOrder { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
