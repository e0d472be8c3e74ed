//! JSON REST API for the Muster session register.
//!
//! Exposes an axum [`Router`] backed by any
//! [`muster_core::store::SessionStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", muster_api::api_router(state))
//! ```

pub mod error;
pub mod reports;
pub mod sessions;

use std::sync::Arc;

use axum::{Router, routing::get};
use muster_core::store::SessionStore;
use muster_mirror::MirrorClient;

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S: SessionStore> {
  pub store:        Arc<S>,
  /// Configured mirror, if any. Mirror outcomes are reported to callers but
  /// never block or roll back a local write.
  pub mirror:       Option<Arc<MirrorClient>>,
  /// Title printed on rendered documents, e.g. the school name.
  pub report_title: String,
}

// Manual impl: `S` itself does not need to be `Clone` behind the `Arc`s.
impl<S: SessionStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      mirror:       self.mirror.clone(),
      report_title: self.report_title.clone(),
    }
  }
}

impl<S: SessionStore> AppState<S> {
  /// Push the table to the mirror after a successful mutation.
  ///
  /// Returns `None` when no mirror is configured, otherwise whether the
  /// push succeeded. Failure is logged and reported, never propagated.
  pub(crate) async fn mirror_table(&self, message: &str) -> Option<bool> {
    let mirror = self.mirror.as_ref()?;
    match mirror.push(message).await {
      Ok(outcome) => {
        tracing::debug!(?outcome, "mirror push succeeded");
        Some(true)
      }
      Err(e) => {
        tracing::warn!(error = %e, "mirror push failed; local table remains authoritative");
        Some(false)
      }
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SessionStore + 'static,
{
  Router::new()
    // Sessions
    .route(
      "/sessions",
      get(sessions::list::<S>).post(sessions::create::<S>),
    )
    .route(
      "/sessions/{ordinal}",
      get(sessions::get_one::<S>).delete(sessions::delete_one::<S>),
    )
    // Reports
    .route("/reports/table", get(reports::table::<S>))
    .route("/reports/document", get(reports::document::<S>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
