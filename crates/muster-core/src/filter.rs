//! The filter engine — pure mapping from (records, window, category
//! filters) to the reporting subset. No clock access: "today" is injected.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::SessionRecord;

// ─── Window ──────────────────────────────────────────────────────────────────

/// A named lookback interval anchored at "today".
///
/// All intervals are fixed day counts; "monthly" is a 30-day lookback, not a
/// calendar-month offset. The lower bound is inclusive and there is no upper
/// bound, so future-dated records always pass.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Window {
  #[default]
  All,
  Weekly,
  Monthly,
  Quarterly,
  Yearly,
}

impl Window {
  /// Days looked back from "today"; `None` for [`Window::All`].
  pub fn lookback_days(self) -> Option<u64> {
    match self {
      Window::All       => None,
      Window::Weekly    => Some(7),
      Window::Monthly   => Some(30),
      Window::Quarterly => Some(90),
      Window::Yearly    => Some(365),
    }
  }

  /// Whether `date` falls inside the window anchored at `today`.
  ///
  /// A record with no parseable date (`None`) passes only [`Window::All`].
  pub fn contains(self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
    let Some(days) = self.lookback_days() else {
      return true;
    };
    let Some(date) = date else {
      return false;
    };
    let cutoff = today - Days::new(days);
    date >= cutoff
  }
}

// ─── Category filters ────────────────────────────────────────────────────────

/// A record field that can carry a categorical filter.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterField {
  Grade,
  Subject,
  Theme,
  Facilitator,
}

/// Accepted-value sets per field.
///
/// A record passes iff, for every field present in the map, its value is a
/// member of the accepted set. An *empty* accepted set matches nothing —
/// a field mapped to `{}` excludes every record, it does not mean
/// "no filter on this field".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilters(pub BTreeMap<FilterField, BTreeSet<String>>);

impl CategoryFilters {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Add one accepted value for `field`.
  pub fn accept(&mut self, field: FilterField, value: impl Into<String>) {
    self.0.entry(field).or_default().insert(value.into());
  }

  /// Map `field` to an empty accepted set (matches nothing).
  pub fn accept_nothing(&mut self, field: FilterField) {
    self.0.entry(field).or_default();
  }

  fn field_value(record: &SessionRecord, field: FilterField) -> String {
    match field {
      FilterField::Grade => {
        record.grade.map(|g| g.to_string()).unwrap_or_default()
      }
      FilterField::Subject     => record.subject.clone(),
      FilterField::Theme       => record.theme.clone(),
      FilterField::Facilitator => record.facilitator.clone(),
    }
  }

  pub fn matches(&self, record: &SessionRecord) -> bool {
    self.0.iter().all(|(field, accepted)| {
      accepted.contains(&Self::field_value(record, *field))
    })
  }
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Select the records passing both the window and every category filter.
/// Pure; input order is preserved.
pub fn filter(
  records: &[SessionRecord],
  window: Window,
  filters: &CategoryFilters,
  today: NaiveDate,
) -> Vec<SessionRecord> {
  records
    .iter()
    .filter(|r| window.contains(r.date, today) && filters.matches(r))
    .cloned()
    .collect()
}

/// Human-readable description of the active filters, used in report headers.
pub fn describe(window: Window, filters: &CategoryFilters) -> String {
  let mut out = format!("window: {window}");
  for (field, accepted) in &filters.0 {
    let values: Vec<&str> = accepted.iter().map(String::as_str).collect();
    out.push_str(&format!("; {field} in [{}]", values.join(", ")));
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Grade;

  fn record(date: Option<&str>, subject: &str) -> SessionRecord {
    SessionRecord {
      date:           date.map(|d| d.parse().unwrap()),
      grade:          Some(Grade::Grade9),
      subject:        subject.into(),
      theme:          "Revision".into(),
      start_time:     None,
      end_time:       None,
      invited_count:  10,
      attended_count: 8,
      facilitator:    "C. Nel".into(),
      photo_ref:      None,
      sheet_refs:     vec![],
    }
  }

  fn today() -> NaiveDate {
    "2024-03-15".parse().unwrap()
  }

  // ── Window boundaries ───────────────────────────────────────────────────

  #[test]
  fn weekly_boundary_is_inclusive() {
    let window = Window::Weekly;
    assert!(window.contains(Some("2024-03-08".parse().unwrap()), today()));
    assert!(!window.contains(Some("2024-03-07".parse().unwrap()), today()));
  }

  #[test]
  fn future_dates_always_pass() {
    for w in [Window::Weekly, Window::Monthly, Window::Quarterly, Window::Yearly] {
      assert!(w.contains(Some("2025-01-01".parse().unwrap()), today()));
    }
  }

  #[test]
  fn unknown_date_passes_only_all() {
    assert!(Window::All.contains(None, today()));
    for w in [Window::Weekly, Window::Monthly, Window::Quarterly, Window::Yearly] {
      assert!(!w.contains(None, today()));
    }
  }

  #[test]
  fn monthly_is_thirty_days() {
    let window = Window::Monthly;
    assert!(window.contains(Some("2024-02-14".parse().unwrap()), today()));
    assert!(!window.contains(Some("2024-02-13".parse().unwrap()), today()));
  }

  // ── Category filters ────────────────────────────────────────────────────

  #[test]
  fn empty_accepted_set_matches_nothing() {
    let records = vec![record(Some("2024-03-14"), "Mathematics")];
    let mut filters = CategoryFilters::new();
    filters.accept_nothing(FilterField::Subject);
    let out = filter(&records, Window::All, &filters, today());
    assert!(out.is_empty());
  }

  #[test]
  fn accepted_value_matches() {
    let records = vec![
      record(Some("2024-03-14"), "Mathematics"),
      record(Some("2024-03-14"), "Physics"),
    ];
    let mut filters = CategoryFilters::new();
    filters.accept(FilterField::Subject, "Mathematics");
    let out = filter(&records, Window::All, &filters, today());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].subject, "Mathematics");
  }

  #[test]
  fn all_mapped_fields_must_match() {
    let records = vec![record(Some("2024-03-14"), "Mathematics")];
    let mut filters = CategoryFilters::new();
    filters.accept(FilterField::Subject, "Mathematics");
    filters.accept(FilterField::Facilitator, "Somebody Else");
    let out = filter(&records, Window::All, &filters, today());
    assert!(out.is_empty());
  }

  #[test]
  fn grade_filter_uses_label() {
    let records = vec![record(Some("2024-03-14"), "Mathematics")];
    let mut filters = CategoryFilters::new();
    filters.accept(FilterField::Grade, "9");
    assert_eq!(filter(&records, Window::All, &filters, today()).len(), 1);
  }

  #[test]
  fn missing_grade_matches_only_empty_string() {
    let mut r = record(Some("2024-03-14"), "Mathematics");
    r.grade = None;
    let mut filters = CategoryFilters::new();
    filters.accept(FilterField::Grade, "");
    assert_eq!(filter(&[r], Window::All, &filters, today()).len(), 1);
  }

  #[test]
  fn describe_lists_window_and_fields() {
    let mut filters = CategoryFilters::new();
    filters.accept(FilterField::Subject, "Mathematics");
    filters.accept(FilterField::Subject, "Physics");
    let d = describe(Window::Weekly, &filters);
    assert_eq!(d, "window: weekly; subject in [Mathematics, Physics]");
  }
}
