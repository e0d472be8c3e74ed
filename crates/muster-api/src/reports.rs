//! Handlers for `/reports` downloads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/table` | Delimited-text export of the filtered view |
//! | `GET`  | `/reports/document` | WordprocessingML document |
//!
//! Both accept the same query parameters as `GET /sessions`.

use axum::{
  extract::{Query, State},
  http::{HeaderName, header},
  response::IntoResponse,
};
use chrono::Utc;
use muster_core::{filter, store::SessionStore};
use muster_report::{ReportMeta, StoreArtifacts, render_document, render_table};

use crate::{AppState, error::ApiError, sessions::ListParams};

/// `GET /reports/table?window=...`
pub async fn table<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SessionStore,
{
  let records = state.store.load_all()?;
  let selected = filter::filter(
    &records,
    params.window,
    &params.category_filters(),
    Utc::now().date_naive(),
  );
  let bytes = render_table(&selected);

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"intervention-sessions.csv\"",
      ),
    ],
    bytes,
  ))
}

/// `GET /reports/document?window=...`
///
/// Render warnings do not fail the request; their count is reported in the
/// `x-render-warnings` response header.
pub async fn document<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SessionStore,
{
  let records = state.store.load_all()?;
  let category_filters = params.category_filters();
  let selected = filter::filter(
    &records,
    params.window,
    &category_filters,
    Utc::now().date_naive(),
  );

  let meta = ReportMeta {
    title:        state.report_title.clone(),
    filter:       filter::describe(params.window, &category_filters),
    generated_at: Utc::now(),
  };
  let rendered =
    render_document(&selected, &meta, &StoreArtifacts(&*state.store));

  let headers = [
    (header::CONTENT_TYPE, "application/vnd.ms-word".to_string()),
    (
      header::CONTENT_DISPOSITION,
      "attachment; filename=\"intervention-report.xml\"".to_string(),
    ),
    (
      HeaderName::from_static("x-render-warnings"),
      rendered.warnings.len().to_string(),
    ),
  ];
  Ok((headers, rendered.bytes))
}
