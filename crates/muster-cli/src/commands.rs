//! Subcommand implementations.

use std::{path::Path, path::PathBuf, str::FromStr as _, sync::Arc};

use anyhow::{Context as _, bail};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use muster_api::AppState;
use muster_core::{
  filter::{CategoryFilters, FilterField, Window, describe, filter},
  record::{Grade, NewSession, SessionRecord},
  store::SessionStore as _,
};
use muster_mirror::{MirrorClient, MirrorConfig};
use muster_report::{ReportMeta, StoreArtifacts, render_document, render_table};
use muster_store_csv::CsvStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn open_store(cfg: &Config) -> anyhow::Result<CsvStore> {
  CsvStore::open(&cfg.data_dir)
    .with_context(|| format!("failed to open store at {}", cfg.data_dir.display()))
}

fn mirror_client(cfg: &Config, store: &CsvStore) -> anyhow::Result<Option<MirrorClient>> {
  let Some(settings) = &cfg.mirror else {
    return Ok(None);
  };
  let client = MirrorClient::new(MirrorConfig {
    local_path:  store.table_path().to_path_buf(),
    repo:        settings.repo.clone(),
    remote_path: settings.remote_path.clone(),
    branch:      settings.branch.clone(),
    token:       settings.token.clone(),
  })
  .context("failed to build mirror client")?;
  Ok(Some(client))
}

/// Push to the mirror after a local mutation. The local table is the source
/// of truth: failure is reported, never fatal.
async fn mirror_after_write(cfg: &Config, store: &CsvStore, message: &str) {
  match mirror_client(cfg, store) {
    Ok(Some(client)) => match client.push(message).await {
      Ok(outcome) => println!("mirror: {outcome:?}"),
      Err(e) => tracing::warn!(error = %e, "mirror push failed; local table kept"),
    },
    Ok(None) => {}
    Err(e) => tracing::warn!(error = %e, "mirror not usable"),
  }
}

fn parse_window(raw: &str) -> anyhow::Result<Window> {
  Window::from_str(raw)
    .map_err(|_| anyhow::anyhow!("unknown window {raw:?} (all, weekly, monthly, quarterly, yearly)"))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}

fn parse_time(raw: &str) -> anyhow::Result<NaiveTime> {
  NaiveTime::parse_from_str(raw, "%H:%M")
    .with_context(|| format!("invalid time {raw:?}, expected HH:MM"))
}

fn category_filters(
  grade: Vec<String>,
  subject: Vec<String>,
  theme: Vec<String>,
  facilitator: Vec<String>,
) -> CategoryFilters {
  let mut filters = CategoryFilters::new();
  let fields = [
    (FilterField::Grade, grade),
    (FilterField::Subject, subject),
    (FilterField::Theme, theme),
    (FilterField::Facilitator, facilitator),
  ];
  for (field, values) in fields {
    for value in values {
      filters.accept(field, value);
    }
  }
  filters
}

fn filtered_view(
  store: &CsvStore,
  window: Window,
  filters: &CategoryFilters,
) -> anyhow::Result<Vec<SessionRecord>> {
  let records = store.load_all().context("failed to load the table")?;
  Ok(filter(&records, window, filters, Local::now().date_naive()))
}

// ─── add ─────────────────────────────────────────────────────────────────────

pub struct AddArgs {
  pub date:        Option<String>,
  pub grade:       Option<String>,
  pub subject:     String,
  pub theme:       String,
  pub start:       Option<String>,
  pub end:         Option<String>,
  pub invited:     u32,
  pub attended:    u32,
  pub facilitator: String,
  pub photo:       Option<PathBuf>,
  pub sheets:      Vec<PathBuf>,
}

pub async fn add(cfg: &Config, args: AddArgs) -> anyhow::Result<()> {
  let store = open_store(cfg)?;

  let date = match &args.date {
    Some(raw) => parse_date(raw)?,
    None => Local::now().date_naive(),
  };
  let grade = args
    .grade
    .as_deref()
    .map(|raw| {
      Grade::from_str(raw)
        .map_err(|_| anyhow::anyhow!("unknown grade {raw:?} (R, 8, 9, 10, 11, 12)"))
    })
    .transpose()?;
  let start_time = args.start.as_deref().map(parse_time).transpose()?;
  let end_time = args.end.as_deref().map(parse_time).transpose()?;

  let photo_ref = match &args.photo {
    Some(path) => Some(save_attachment(&store, path, true)?),
    None => None,
  };
  let mut sheet_refs = Vec::with_capacity(args.sheets.len());
  for path in &args.sheets {
    sheet_refs.push(save_attachment(&store, path, false)?);
  }

  let ordinal = store.append(NewSession {
    date,
    grade,
    subject: args.subject,
    theme: args.theme,
    start_time,
    end_time,
    invited_count: args.invited,
    attended_count: args.attended,
    facilitator: args.facilitator,
    photo_ref,
    sheet_refs,
  })?;

  println!("stored session at ordinal {ordinal}");
  mirror_after_write(cfg, &store, "log intervention session").await;
  Ok(())
}

fn save_attachment(
  store: &CsvStore,
  path: &Path,
  is_photo: bool,
) -> anyhow::Result<String> {
  let bytes = std::fs::read(path)
    .with_context(|| format!("failed to read attachment {}", path.display()))?;
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .unwrap_or("attachment.bin");
  let saved = if is_photo {
    store.save_photo(&bytes, name)
  } else {
    store.save_sheet(&bytes, name)
  };
  Ok(saved?)
}

// ─── list ────────────────────────────────────────────────────────────────────

pub fn list(
  cfg: &Config,
  window: &str,
  grade: Vec<String>,
  subject: Vec<String>,
  theme: Vec<String>,
  facilitator: Vec<String>,
) -> anyhow::Result<()> {
  let store = open_store(cfg)?;
  let window = parse_window(window)?;
  let filters = category_filters(grade, subject, theme, facilitator);
  let selected = filtered_view(&store, window, &filters)?;

  println!("{}", describe(window, &filters));
  if selected.is_empty() {
    println!("no sessions match");
    return Ok(());
  }

  println!(
    "{:<4} {:<10} {:<5} {:<18} {:<24} {:>7} {:>8} {:>7}  {}",
    "ord", "date", "grade", "subject", "theme", "invited", "attended", "%", "facilitator"
  );
  for (ordinal, r) in selected.iter().enumerate() {
    let date = r
      .date
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_else(|| "unknown".to_string());
    let grade = r.grade.map(|g| g.to_string()).unwrap_or_default();
    println!(
      "{:<4} {:<10} {:<5} {:<18} {:<24} {:>7} {:>8} {:>7.2}  {}",
      ordinal,
      date,
      grade,
      truncate(&r.subject, 18),
      truncate(&r.theme, 24),
      r.invited_count,
      r.attended_count,
      r.attendance_ratio(),
      r.facilitator,
    );
  }

  let invited: u64 = selected.iter().map(|r| u64::from(r.invited_count)).sum();
  let attended: u64 = selected.iter().map(|r| u64::from(r.attended_count)).sum();
  let mean: f64 = selected
    .iter()
    .map(SessionRecord::attendance_ratio)
    .sum::<f64>()
    / selected.len() as f64;
  println!(
    "{} sessions, {invited} invited, {attended} attended, mean attendance {mean:.2}%",
    selected.len()
  );
  Ok(())
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}~")
  }
}

// ─── delete ──────────────────────────────────────────────────────────────────

pub async fn delete(cfg: &Config, ordinal: usize) -> anyhow::Result<()> {
  let store = open_store(cfg)?;
  let removed = store.delete(ordinal)?;
  println!(
    "removed session {ordinal}: {} ({})",
    removed.subject,
    removed
      .date
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_else(|| "unknown".to_string()),
  );
  mirror_after_write(cfg, &store, "remove intervention session").await;
  Ok(())
}

// ─── export ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn export(
  cfg: &Config,
  format: &str,
  out: &Path,
  window: &str,
  grade: Vec<String>,
  subject: Vec<String>,
  theme: Vec<String>,
  facilitator: Vec<String>,
) -> anyhow::Result<()> {
  let store = open_store(cfg)?;
  let window = parse_window(window)?;
  let filters = category_filters(grade, subject, theme, facilitator);
  let selected = filtered_view(&store, window, &filters)?;

  let bytes = match format {
    "table" => render_table(&selected),
    "document" => {
      let meta = ReportMeta {
        title:        cfg.report_title.clone(),
        filter:       describe(window, &filters),
        generated_at: Utc::now(),
      };
      let rendered = render_document(&selected, &meta, &StoreArtifacts(&store));
      for warning in &rendered.warnings {
        tracing::warn!(%warning, "render warning");
      }
      rendered.bytes
    }
    other => bail!("unknown export format {other:?} (table, document)"),
  };

  std::fs::write(out, bytes)
    .with_context(|| format!("failed to write {}", out.display()))?;
  println!("wrote {} sessions to {}", selected.len(), out.display());
  Ok(())
}

// ─── sync ────────────────────────────────────────────────────────────────────

pub async fn sync(cfg: &Config) -> anyhow::Result<()> {
  let store = open_store(cfg)?;
  let Some(client) = mirror_client(cfg, &store)? else {
    bail!("no [mirror] section in the config; nothing to sync to");
  };
  let outcome = client
    .push("manual table sync")
    .await
    .context("mirror push failed")?;
  println!("mirror: {outcome:?}");
  Ok(())
}

// ─── serve ───────────────────────────────────────────────────────────────────

pub async fn serve(cfg: &Config) -> anyhow::Result<()> {
  let store = open_store(cfg)?;
  let mirror = mirror_client(cfg, &store)?.map(Arc::new);

  let state = AppState {
    store: Arc::new(store),
    mirror,
    report_title: cfg.report_title.clone(),
  };

  let app = axum::Router::new()
    .nest("/api", muster_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
