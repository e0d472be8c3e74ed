//! Runtime configuration, layered from `config.toml` and `MUSTER_*`
//! environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default = "default_data_dir")]
  pub data_dir:     PathBuf,
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Title printed on rendered documents, e.g. the school name.
  #[serde(default = "default_report_title")]
  pub report_title: String,
  /// Optional GitHub mirror of the table file. Absent means local-only.
  pub mirror:       Option<MirrorSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorSettings {
  /// `owner/name` of the target repository.
  pub repo:        String,
  #[serde(default = "default_branch")]
  pub branch:      String,
  #[serde(default = "default_remote_path")]
  pub remote_path: String,
  /// Personal access token with contents write access.
  pub token:       String,
}

fn default_data_dir() -> PathBuf {
  PathBuf::from("data")
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  5180
}

fn default_report_title() -> String {
  "Intervention session register".to_string()
}

fn default_branch() -> String {
  "main".to_string()
}

fn default_remote_path() -> String {
  "sessions.csv".to_string()
}

/// Load configuration: `config.toml` (optional) overridden by `MUSTER_*`
/// environment variables.
pub fn load(path: &std::path::Path) -> anyhow::Result<Config> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("MUSTER").separator("__"))
    .build()
    .context("failed to read config")?;

  settings
    .try_deserialize()
    .context("failed to deserialise Config")
}
