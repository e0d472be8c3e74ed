//! Async HTTP client wrapping the GitHub contents API for one file.

use std::{path::PathBuf, time::Duration};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("muster/", env!("CARGO_PKG_VERSION"));

// ─── Configuration ───────────────────────────────────────────────────────────

/// Where and how the table file is mirrored.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
  /// Local path of the file to mirror.
  pub local_path:  PathBuf,
  /// `owner/name` of the target repository.
  pub repo:        String,
  /// Path of the file inside the repository.
  pub remote_path: String,
  pub branch:      String,
  /// Personal access token with contents write access.
  pub token:       String,
}

/// What the upload did on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
  Created,
  Updated,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ContentsProbe {
  sha: String,
}

#[derive(Debug, Serialize)]
struct ContentsPut<'a> {
  message: &'a str,
  content: String,
  branch:  &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  sha:     Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for upload-or-update of the mirrored file.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct MirrorClient {
  client: Client,
  config: MirrorConfig,
}

impl MirrorClient {
  pub fn new(config: MirrorConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn contents_url(&self) -> String {
    format!(
      "{API_BASE}/repos/{}/contents/{}",
      self.config.repo, self.config.remote_path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req
      .header(header::AUTHORIZATION, format!("token {}", self.config.token))
      .header(header::USER_AGENT, USER_AGENT)
  }

  /// The current blob sha of the remote file, or `None` if it does not
  /// exist yet ("not found" means "create", not an error).
  async fn probe_sha(&self) -> Result<Option<String>> {
    let resp = self
      .auth(self.client.get(self.contents_url()))
      .query(&[("ref", self.config.branch.as_str())])
      .send()
      .await?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !resp.status().is_success() {
      return Err(Error::Upload {
        status: resp.status().as_u16(),
        body:   resp.text().await.unwrap_or_default(),
      });
    }
    let probe: ContentsProbe = resp.json().await?;
    Ok(Some(probe.sha))
  }

  /// Upload the configured local file, creating or updating the remote copy.
  pub async fn push(&self, message: &str) -> Result<MirrorOutcome> {
    let bytes = std::fs::read(&self.config.local_path)?;
    let sha = self.probe_sha().await?;
    let outcome = if sha.is_some() {
      MirrorOutcome::Updated
    } else {
      MirrorOutcome::Created
    };

    let body = ContentsPut {
      message,
      content: B64.encode(&bytes),
      branch: &self.config.branch,
      sha,
    };

    let resp = self
      .auth(self.client.put(self.contents_url()))
      .json(&body)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Upload {
        status: resp.status().as_u16(),
        body:   resp.text().await.unwrap_or_default(),
      });
    }

    tracing::info!(
      repo = %self.config.repo,
      path = %self.config.remote_path,
      ?outcome,
      "table mirrored"
    );
    Ok(outcome)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> MirrorConfig {
    MirrorConfig {
      local_path:  PathBuf::from("/tmp/sessions.csv"),
      repo:        "example/register-data".into(),
      remote_path: "sessions.csv".into(),
      branch:      "main".into(),
      token:       "t0ken".into(),
    }
  }

  #[test]
  fn contents_url_targets_repo_and_path() {
    let client = MirrorClient::new(config()).unwrap();
    assert_eq!(
      client.contents_url(),
      "https://api.github.com/repos/example/register-data/contents/sessions.csv"
    );
  }

  #[test]
  fn put_body_includes_sha_only_when_updating() {
    let create = ContentsPut {
      message: "update table",
      content: B64.encode(b"date,subject\n"),
      branch:  "main",
      sha:     None,
    };
    let json = serde_json::to_value(&create).unwrap();
    assert!(json.get("sha").is_none());
    assert_eq!(json["branch"], "main");
    assert_eq!(json["message"], "update table");

    let update = ContentsPut { sha: Some("abc123".into()), ..create };
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["sha"], "abc123");
  }

  #[test]
  fn content_is_base64_of_file_bytes() {
    let body = ContentsPut {
      message: "m",
      content: B64.encode(b"hello"),
      branch:  "main",
      sha:     None,
    };
    assert_eq!(body.content, "aGVsbG8=");
  }
}
