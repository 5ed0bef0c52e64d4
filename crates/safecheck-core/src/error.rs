//! Error types for `safecheck-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected before any read or write, e.g. a blank `uid`.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The target record is not in a state that allows the operation.
  #[error("invariant violation: {0}")]
  InvariantViolation(String),

  /// Opaque failure reported by the storage collaborator.
  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error without changing its kind.
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fail fast on an empty or whitespace-only identifier.
pub fn require_non_blank(name: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidArgument(format!("{name} must not be blank")));
  }
  Ok(())
}
