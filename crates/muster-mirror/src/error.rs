//! Error type for `muster-mirror`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("could not read local file: {0}")]
  Io(#[from] std::io::Error),

  #[error("upload rejected: {status}: {body}")]
  Upload { status: u16, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
