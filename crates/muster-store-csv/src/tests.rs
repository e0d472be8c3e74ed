//! Integration tests for `CsvStore` against a temporary data directory.

use muster_core::{
  Error,
  record::{Grade, NewSession},
  store::SessionStore,
};

use crate::CsvStore;

fn store() -> (tempfile::TempDir, CsvStore) {
  let dir = tempfile::tempdir().expect("tempdir");
  let store = CsvStore::open(dir.path()).expect("open store");
  (dir, store)
}

fn session(subject: &str, facilitator: &str) -> NewSession {
  NewSession {
    date:           "2024-03-15".parse().unwrap(),
    grade:          Some(Grade::Grade10),
    subject:        subject.into(),
    theme:          "Exam revision".into(),
    start_time:     chrono::NaiveTime::from_hms_opt(14, 30, 0),
    end_time:       chrono::NaiveTime::from_hms_opt(15, 30, 0),
    invited_count:  20,
    attended_count: 15,
    facilitator:    facilitator.into(),
    photo_ref:      None,
    sheet_refs:     vec![],
  }
}

// ─── Initialisation ──────────────────────────────────────────────────────────

#[test]
fn open_creates_header_only_table() {
  let (dir, store) = store();
  let text = std::fs::read_to_string(store.table_path()).unwrap();
  assert_eq!(
    text,
    "date,grade,subject,theme,start_time,end_time,invited,attended,facilitator,photo,sheets,ratio\n"
  );
  assert!(dir.path().join("photos").is_dir());
  assert!(dir.path().join("sheets").is_dir());
  assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn open_is_idempotent() {
  let (dir, store) = store();
  store.append(session("Maths", "A. Botha")).unwrap();
  drop(store);
  let reopened = CsvStore::open(dir.path()).unwrap();
  assert_eq!(reopened.load_all().unwrap().len(), 1);
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[test]
fn append_then_load_round_trips_every_field() {
  let (_dir, store) = store();
  let input = session("Physical Science", "D. Plaatjies");
  let ordinal = store.append(input.clone()).unwrap();
  assert_eq!(ordinal, 0);

  let records = store.load_all().unwrap();
  assert_eq!(records.len(), 1);
  let r = &records[0];
  assert_eq!(r.date, Some(input.date));
  assert_eq!(r.grade, input.grade);
  assert_eq!(r.subject, input.subject);
  assert_eq!(r.theme, input.theme);
  assert_eq!(r.start_time, input.start_time);
  assert_eq!(r.end_time, input.end_time);
  assert_eq!(r.invited_count, input.invited_count);
  assert_eq!(r.attended_count, input.attended_count);
  assert_eq!(r.facilitator, input.facilitator);
  assert_eq!(r.photo_ref, None);
  assert!(r.sheet_refs.is_empty());
}

#[test]
fn round_trip_survives_awkward_text() {
  let (_dir, store) = store();
  let mut input = session("Maths", "A. Botha");
  input.theme = "Fractions, decimals and \"percentages\"\nday two".into();
  store.append(input.clone()).unwrap();

  // Force a re-read from disk through a fresh store handle.
  let reopened = CsvStore::open(store.table_path().parent().unwrap()).unwrap();
  let records = reopened.load_all().unwrap();
  assert_eq!(records[0].theme, input.theme);
}

#[test]
fn ordinals_follow_insertion_order() {
  let (_dir, store) = store();
  assert_eq!(store.append(session("Maths", "A")).unwrap(), 0);
  assert_eq!(store.append(session("Physics", "B")).unwrap(), 1);
  assert_eq!(store.append(session("English", "C")).unwrap(), 2);
  let records = store.load_all().unwrap();
  assert_eq!(records[1].subject, "Physics");
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[test]
fn invalid_submission_leaves_table_unchanged() {
  let (_dir, store) = store();
  store.append(session("Maths", "A. Botha")).unwrap();

  let mut bad = session("Physics", "B. Cloete");
  bad.attended_count = 25;
  let err = store.append(bad).unwrap_err();
  assert!(err.is_validation());
  assert!(matches!(err, Error::AttendanceExceedsInvited { .. }));

  assert_eq!(store.load_all().unwrap().len(), 1);
}

// ─── Lenient reads ───────────────────────────────────────────────────────────

#[test]
fn unparseable_date_row_is_retained() {
  let dir = tempfile::tempdir().unwrap();
  let table = dir.path().join("sessions.csv");
  std::fs::write(
    &table,
    "date,grade,subject,theme,start_time,end_time,invited,attended,facilitator,photo,sheets,ratio\n\
     15 Maart,10,Maths,Revision,,,10,8,A. Botha,,,80.00\n",
  )
  .unwrap();

  let store = CsvStore::open(dir.path()).unwrap();
  let records = store.load_all().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].date, None);
  assert_eq!(records[0].subject, "Maths");
}

#[test]
fn older_narrow_table_is_readable() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(
    dir.path().join("sessions.csv"),
    "date,subject,invited,attended,facilitator\n2024-01-10,Maths,12,9,A. Botha\n",
  )
  .unwrap();

  let store = CsvStore::open(dir.path()).unwrap();
  let records = store.load_all().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].grade, None);
  assert_eq!(records[0].theme, "");
  assert_eq!(records[0].invited_count, 12);
}

#[test]
fn append_recreates_unreadable_table() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("sessions.csv"), "\"broken\n").unwrap();

  let store = CsvStore::open(dir.path()).unwrap();
  let ordinal = store.append(session("Maths", "A. Botha")).unwrap();
  assert_eq!(ordinal, 0);
  assert_eq!(store.load_all().unwrap().len(), 1);
}

#[test]
fn load_all_surfaces_corrupt_table() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("sessions.csv"), "\"broken\n").unwrap();

  let store = CsvStore::open(dir.path()).unwrap();
  assert!(matches!(store.load_all(), Err(Error::Corrupt(_))));
}

// ─── Deletion ────────────────────────────────────────────────────────────────

#[test]
fn delete_out_of_range_is_not_found() {
  let (_dir, store) = store();
  store.append(session("Maths", "A")).unwrap();
  let err = store.delete(5).unwrap_err();
  assert!(matches!(err, Error::OrdinalOutOfRange { ordinal: 5, len: 1 }));
}

#[test]
fn delete_shifts_subsequent_ordinals() {
  let (_dir, store) = store();
  store.append(session("Maths", "A")).unwrap();
  store.append(session("Physics", "B")).unwrap();
  store.append(session("English", "C")).unwrap();

  let removed = store.delete(1).unwrap();
  assert_eq!(removed.subject, "Physics");

  let records = store.load_all().unwrap();
  assert_eq!(records.len(), 2);
  // The record formerly at ordinal 2 is now at ordinal 1.
  assert_eq!(records[1].subject, "English");

  // A stale ordinal addresses whatever currently sits there.
  let removed_again = store.delete(1).unwrap();
  assert_eq!(removed_again.subject, "English");
}

#[test]
fn delete_cascades_to_owned_artifacts() {
  let (dir, store) = store();
  let photo_ref = store.save_photo(b"jpegbytes", "class.jpg").unwrap();
  let sheet_ref = store.save_sheet(b"a,b\n1,2\n", "register.csv").unwrap();

  let mut input = session("Maths", "A. Botha");
  input.photo_ref = Some(photo_ref.clone());
  input.sheet_refs = vec![sheet_ref.clone()];
  store.append(input).unwrap();

  assert!(dir.path().join(&photo_ref).exists());
  assert!(dir.path().join(&sheet_ref).exists());

  store.delete(0).unwrap();
  assert!(!dir.path().join(&photo_ref).exists());
  assert!(!dir.path().join(&sheet_ref).exists());
}

#[test]
fn delete_tolerates_already_missing_artifacts() {
  let (dir, store) = store();
  let photo_ref = store.save_photo(b"jpegbytes", "class.jpg").unwrap();

  let mut input = session("Maths", "A. Botha");
  input.photo_ref = Some(photo_ref.clone());
  store.append(input).unwrap();

  std::fs::remove_file(dir.path().join(&photo_ref)).unwrap();
  // Must not error even though the artifact is gone.
  let removed = store.delete(0).unwrap();
  assert_eq!(removed.photo_ref, Some(photo_ref));
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

#[test]
fn artifact_names_do_not_collide() {
  let (_dir, store) = store();
  let a = store.save_photo(b"one", "class.jpg").unwrap();
  let b = store.save_photo(b"two", "class.jpg").unwrap();
  assert_ne!(a, b);
  assert!(a.starts_with("photos/"));
  assert!(a.ends_with(".jpg"));
}

#[test]
fn read_artifact_round_trips() {
  let (_dir, store) = store();
  let sheet_ref = store.save_sheet(b"a,b\n1,2\n", "register.csv").unwrap();
  assert_eq!(store.read_artifact(&sheet_ref).unwrap(), b"a,b\n1,2\n");
}

#[test]
fn read_artifact_rejects_parent_traversal() {
  let (_dir, store) = store();
  assert!(store.read_artifact("../../etc/passwd").is_err());
}

// ─── Cache invalidation ──────────────────────────────────────────────────────

#[test]
fn cache_reflects_every_mutation() {
  let (_dir, store) = store();
  assert!(store.load_all().unwrap().is_empty());
  store.append(session("Maths", "A")).unwrap();
  assert_eq!(store.load_all().unwrap().len(), 1);
  store.delete(0).unwrap();
  assert!(store.load_all().unwrap().is_empty());
}
