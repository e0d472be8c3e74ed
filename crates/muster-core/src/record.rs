//! Session records — the fundamental unit of the Muster register.
//!
//! A record is one logged intervention-class event. Records are never
//! mutated in place: they are created by a validated submission and
//! destroyed by an explicit deletion that cascades to owned artifacts.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Grade ───────────────────────────────────────────────────────────────────

/// Grade level of the learners a session was held for.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Grade {
  #[serde(rename = "R")]
  #[strum(serialize = "R")]
  R,
  #[serde(rename = "8")]
  #[strum(serialize = "8")]
  Grade8,
  #[serde(rename = "9")]
  #[strum(serialize = "9")]
  Grade9,
  #[serde(rename = "10")]
  #[strum(serialize = "10")]
  Grade10,
  #[serde(rename = "11")]
  #[strum(serialize = "11")]
  Grade11,
  #[serde(rename = "12")]
  #[strum(serialize = "12")]
  Grade12,
}

// ─── SessionRecord ───────────────────────────────────────────────────────────

/// One logged intervention session as read back from the durable table.
///
/// `date` is `None` when the stored value could not be parsed as a calendar
/// date; such rows are retained (never dropped) and excluded from every
/// window filter except "all".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
  pub date:           Option<NaiveDate>,
  pub grade:          Option<Grade>,
  pub subject:        String,
  pub theme:          String,
  pub start_time:     Option<NaiveTime>,
  pub end_time:       Option<NaiveTime>,
  pub invited_count:  u32,
  pub attended_count: u32,
  pub facilitator:    String,
  /// Relative path into the photo bucket, if a photo was attached.
  pub photo_ref:      Option<String>,
  /// Relative paths into the attendance-sheet bucket.
  pub sheet_refs:     Vec<String>,
}

impl SessionRecord {
  /// Percentage of invited learners who attended, rounded to two decimal
  /// places. Defined as `0.0` when nobody was invited.
  ///
  /// Always computed from the counts; a persisted copy in the table is a
  /// display cache and is never trusted on read.
  pub fn attendance_ratio(&self) -> f64 {
    if self.invited_count == 0 {
      return 0.0;
    }
    let raw =
      f64::from(self.attended_count) / f64::from(self.invited_count) * 100.0;
    (raw * 100.0).round() / 100.0
  }
}

// ─── NewSession ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::SessionStore::append`].
///
/// Unlike [`SessionRecord`], a submission always carries a real calendar
/// date — "unknown" dates only arise from rows already in the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
  pub date:           NaiveDate,
  pub grade:          Option<Grade>,
  pub subject:        String,
  pub theme:          String,
  pub start_time:     Option<NaiveTime>,
  pub end_time:       Option<NaiveTime>,
  pub invited_count:  u32,
  pub attended_count: u32,
  pub facilitator:    String,
  pub photo_ref:      Option<String>,
  #[serde(default)]
  pub sheet_refs:     Vec<String>,
}

impl NewSession {
  /// Check every submission invariant. On failure nothing may be persisted.
  pub fn validate(&self) -> Result<()> {
    if self.subject.trim().is_empty() {
      return Err(Error::MissingField("subject"));
    }
    if self.theme.trim().is_empty() {
      return Err(Error::MissingField("theme"));
    }
    if self.facilitator.trim().is_empty() {
      return Err(Error::MissingField("facilitator"));
    }
    if self.invited_count == 0 {
      return Err(Error::NoInvitees);
    }
    if self.attended_count > self.invited_count {
      return Err(Error::AttendanceExceedsInvited {
        attended: self.attended_count,
        invited:  self.invited_count,
      });
    }
    if let (Some(start), Some(end)) = (self.start_time, self.end_time)
      && start >= end
    {
      return Err(Error::TimeOrder { start, end });
    }
    Ok(())
  }

  /// The record this submission becomes once appended.
  pub fn into_record(self) -> SessionRecord {
    SessionRecord {
      date:           Some(self.date),
      grade:          self.grade,
      subject:        self.subject,
      theme:          self.theme,
      start_time:     self.start_time,
      end_time:       self.end_time,
      invited_count:  self.invited_count,
      attended_count: self.attended_count,
      facilitator:    self.facilitator,
      photo_ref:      self.photo_ref,
      sheet_refs:     self.sheet_refs,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
