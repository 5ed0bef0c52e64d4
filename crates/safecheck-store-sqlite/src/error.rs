//! Error type for `safecheck-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A column held a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),

  /// A `Replace` targeted a version that does not exist. The whole batch was
  /// rolled back.
  #[error("version {uid}/{version_id} not found")]
  VersionNotFound { uid: String, version_id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
