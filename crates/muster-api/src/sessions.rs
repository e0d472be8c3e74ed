//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sessions` | Filtered list; `?window=` + category params |
//! | `GET`    | `/sessions/:ordinal` | Single record |
//! | `POST`   | `/sessions` | Body: [`NewSessionBody`]; returns 201 |
//! | `DELETE` | `/sessions/:ordinal` | Cascading delete, shifts ordinals |
//!
//! Category params take comma-separated accepted values. A param that is
//! present but empty (`?subject=`) is an empty accepted set and matches
//! nothing — an empty multi-select is not "no filter".

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{NaiveDate, NaiveTime, Utc};
use muster_core::{
  filter::{CategoryFilters, FilterField, Window, filter},
  record::{Grade, NewSession, SessionRecord},
  store::SessionStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Lookback window; defaults to `all`.
  #[serde(default)]
  pub window:      Window,
  pub grade:       Option<String>,
  pub subject:     Option<String>,
  pub theme:       Option<String>,
  pub facilitator: Option<String>,
}

impl ListParams {
  pub(crate) fn category_filters(&self) -> CategoryFilters {
    let mut filters = CategoryFilters::new();
    let fields = [
      (FilterField::Grade, &self.grade),
      (FilterField::Subject, &self.subject),
      (FilterField::Theme, &self.theme),
      (FilterField::Facilitator, &self.facilitator),
    ];
    for (field, raw) in fields {
      let Some(raw) = raw else { continue };
      filters.accept_nothing(field);
      for value in raw.split(',').filter(|v| !v.is_empty()) {
        filters.accept(field, value);
      }
    }
    filters
  }
}

/// `GET /sessions?window=weekly&subject=Maths,Physics`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SessionRecord>>, ApiError>
where
  S: SessionStore,
{
  let records = state.store.load_all()?;
  let today = Utc::now().date_naive();
  Ok(Json(filter(
    &records,
    params.window,
    &params.category_filters(),
    today,
  )))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /sessions/:ordinal`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(ordinal): Path<usize>,
) -> Result<Json<SessionRecord>, ApiError>
where
  S: SessionStore,
{
  let records = state.store.load_all()?;
  let record = records
    .get(ordinal)
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("no record at ordinal {ordinal}")))?;
  Ok(Json(record))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// An uploaded artifact carried inline as base64.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub file_name:   String,
  pub content_b64: String,
}

/// JSON body accepted by `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct NewSessionBody {
  pub date:           NaiveDate,
  pub grade:          Option<Grade>,
  pub subject:        String,
  pub theme:          String,
  pub start_time:     Option<NaiveTime>,
  pub end_time:       Option<NaiveTime>,
  pub invited_count:  u32,
  pub attended_count: u32,
  pub facilitator:    String,
  pub photo:          Option<UploadBody>,
  #[serde(default)]
  pub sheets:         Vec<UploadBody>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
  pub ordinal:  usize,
  pub record:   SessionRecord,
  /// `None` when no mirror is configured; otherwise whether the push
  /// succeeded. Mirror failure never fails the write.
  pub mirrored: Option<bool>,
}

/// `POST /sessions` — returns 201 + the stored record.
///
/// Artifacts are decoded and persisted first so the appended row already
/// carries their refs; a decode failure rejects the whole submission before
/// anything is written.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewSessionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SessionStore,
{
  let photo_ref = match &body.photo {
    Some(upload) => Some(save_upload(&*state.store, upload, true)?),
    None => None,
  };
  let mut sheet_refs = Vec::with_capacity(body.sheets.len());
  for upload in &body.sheets {
    sheet_refs.push(save_upload(&*state.store, upload, false)?);
  }

  let input = NewSession {
    date:           body.date,
    grade:          body.grade,
    subject:        body.subject,
    theme:          body.theme,
    start_time:     body.start_time,
    end_time:       body.end_time,
    invited_count:  body.invited_count,
    attended_count: body.attended_count,
    facilitator:    body.facilitator,
    photo_ref,
    sheet_refs,
  };

  let ordinal = state.store.append(input)?;
  let record = state
    .store
    .load_all()?
    .get(ordinal)
    .cloned()
    .ok_or_else(|| ApiError::Store("appended record vanished".into()))?;

  let mirrored = state.mirror_table("log intervention session").await;

  Ok((
    StatusCode::CREATED,
    Json(CreatedResponse { ordinal, record, mirrored }),
  ))
}

fn save_upload<S>(
  store: &S,
  upload: &UploadBody,
  is_photo: bool,
) -> Result<String, ApiError>
where
  S: SessionStore + ?Sized,
{
  let bytes = B64
    .decode(&upload.content_b64)
    .map_err(|e| ApiError::BadRequest(format!("invalid base64 upload: {e}")))?;
  let saved = if is_photo {
    store.save_photo(&bytes, &upload.file_name)
  } else {
    store.save_sheet(&bytes, &upload.file_name)
  };
  Ok(saved?)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
  pub removed:  SessionRecord,
  pub mirrored: Option<bool>,
}

/// `DELETE /sessions/:ordinal` — acts on the record *currently* at the
/// ordinal and cascades to its artifacts.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(ordinal): Path<usize>,
) -> Result<Json<DeletedResponse>, ApiError>
where
  S: SessionStore,
{
  let removed = state.store.delete(ordinal)?;
  let mirrored = state.mirror_table("remove intervention session").await;
  Ok(Json(DeletedResponse { removed, mirrored }))
}
