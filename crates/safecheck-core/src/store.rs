//! The `StatusStore` trait and the write batch it commits.
//!
//! The trait is implemented by storage backends (e.g.
//! `safecheck-store-sqlite`, or [`MemoryStore`](crate::memory::MemoryStore)).
//! The engine components depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::record::StatusRecord;

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
  /// Flip every `current` version of one chain to `history`.
  DemoteCurrent {
    uid:       String,
    parent_id: String,
    at:        DateTime<Utc>,
  },
  /// Add a new version. Fails if `(uid, version_id)` is already taken.
  Insert(StatusRecord),
  /// Overwrite the version stored at `(uid, version_id)`. Fails if there is
  /// no such version.
  Replace(StatusRecord),
}

/// Writes that must land together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
  ops: Vec<WriteOp>,
}

impl WriteBatch {
  pub fn new() -> Self { Self::default() }

  pub fn single(op: WriteOp) -> Self { Self { ops: vec![op] } }

  pub fn push(&mut self, op: WriteOp) -> &mut Self {
    self.ops.push(op);
    self
  }

  pub fn ops(&self) -> &[WriteOp] { &self.ops }

  pub fn into_ops(self) -> Vec<WriteOp> { self.ops }

  pub fn len(&self) -> usize { self.ops.len() }

  pub fn is_empty(&self) -> bool { self.ops.is_empty() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a document store partitioned by `uid` and keyed by
/// `(uid, version_id)` within a partition.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StatusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Point read. Returns `None` if not found.
  fn get_version<'a>(
    &'a self,
    uid: &'a str,
    version_id: &'a str,
  ) -> impl Future<Output = Result<Option<StatusRecord>, Self::Error>> + Send + 'a;

  /// The user's version with `status_type == current`, newest first, limit 1.
  fn find_current<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<Option<StatusRecord>, Self::Error>> + Send + 'a;

  /// Number of versions ever written to one chain, whatever their status.
  fn count_versions<'a>(
    &'a self,
    uid: &'a str,
    parent_id: &'a str,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + 'a;

  /// Every version of one chain, newest `created_at` first; ties broken by
  /// descending version number.
  fn list_chain<'a>(
    &'a self,
    uid: &'a str,
    parent_id: &'a str,
  ) -> impl Future<Output = Result<Vec<StatusRecord>, Self::Error>> + Send + 'a;

  /// Collection-group scan: every version of every user except those marked
  /// `deleted`.
  fn scan_all(
    &self,
  ) -> impl Future<Output = Result<Vec<StatusRecord>, Self::Error>> + Send + '_;

  /// Apply every op in `batch` atomically. Readers observe either none of
  /// the writes or all of them.
  fn commit(
    &self,
    batch: WriteBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
