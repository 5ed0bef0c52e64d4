//! An in-process [`StatusStore`] backed by a `BTreeMap`.
//!
//! Useful for tests and for embedding the engine without a database. Batches
//! are applied to a copy of the map and swapped in only if every op
//! succeeds.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::{
  record::{StatusRecord, StatusType},
  store::{StatusStore, WriteBatch, WriteOp},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("version {uid}/{version_id} already exists")]
  Duplicate { uid: String, version_id: String },

  #[error("version {uid}/{version_id} not found")]
  Missing { uid: String, version_id: String },

  #[error("store is refusing writes")]
  Unavailable,
}

type Key = (String, String);

#[derive(Debug, Default)]
struct Inner {
  docs:        BTreeMap<Key, StatusRecord>,
  commits:     usize,
  fail_writes: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of batches committed so far.
  pub fn commit_count(&self) -> usize { self.inner.read().commits }

  /// Make every subsequent `commit` fail with [`MemoryError::Unavailable`].
  pub fn set_fail_writes(&self, fail: bool) { self.inner.write().fail_writes = fail; }

  fn apply(docs: &mut BTreeMap<Key, StatusRecord>, op: WriteOp) -> Result<(), MemoryError> {
    match op {
      WriteOp::DemoteCurrent { uid, parent_id, at } => {
        for record in docs.values_mut().filter(|r| {
          r.uid == uid && r.parent_id == parent_id && r.status_type == StatusType::Current
        }) {
          record.status_type = StatusType::History;
          record.updated_at = at;
        }
      }
      WriteOp::Insert(record) => {
        let key = (record.uid.clone(), record.version_id.clone());
        if docs.contains_key(&key) {
          return Err(MemoryError::Duplicate { uid: key.0, version_id: key.1 });
        }
        docs.insert(key, record);
      }
      WriteOp::Replace(record) => {
        let key = (record.uid.clone(), record.version_id.clone());
        match docs.get_mut(&key) {
          Some(slot) => *slot = record,
          None => return Err(MemoryError::Missing { uid: key.0, version_id: key.1 }),
        }
      }
    }
    Ok(())
  }
}

impl StatusStore for MemoryStore {
  type Error = MemoryError;

  async fn get_version(
    &self,
    uid: &str,
    version_id: &str,
  ) -> Result<Option<StatusRecord>, MemoryError> {
    let key = (uid.to_owned(), version_id.to_owned());
    Ok(self.inner.read().docs.get(&key).cloned())
  }

  async fn find_current(&self, uid: &str) -> Result<Option<StatusRecord>, MemoryError> {
    Ok(
      self
        .inner
        .read()
        .docs
        .values()
        .filter(|r| r.uid == uid && r.status_type == StatusType::Current)
        .max_by_key(|r| (r.created_at, r.version))
        .cloned(),
    )
  }

  async fn count_versions(&self, uid: &str, parent_id: &str) -> Result<u32, MemoryError> {
    let n = self
      .inner
      .read()
      .docs
      .values()
      .filter(|r| r.uid == uid && r.parent_id == parent_id)
      .count();
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
  }

  async fn list_chain(
    &self,
    uid: &str,
    parent_id: &str,
  ) -> Result<Vec<StatusRecord>, MemoryError> {
    let mut chain: Vec<StatusRecord> = self
      .inner
      .read()
      .docs
      .values()
      .filter(|r| r.uid == uid && r.parent_id == parent_id)
      .cloned()
      .collect();
    chain.sort_by(|a, b| {
      b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.version.cmp(&a.version))
    });
    Ok(chain)
  }

  async fn scan_all(&self) -> Result<Vec<StatusRecord>, MemoryError> {
    Ok(
      self
        .inner
        .read()
        .docs
        .values()
        .filter(|r| r.status_type != StatusType::Deleted)
        .cloned()
        .collect(),
    )
  }

  async fn commit(&self, batch: WriteBatch) -> Result<(), MemoryError> {
    let mut inner = self.inner.write();
    if inner.fail_writes {
      return Err(MemoryError::Unavailable);
    }
    let mut docs = inner.docs.clone();
    for op in batch.into_ops() {
      Self::apply(&mut docs, op)?;
    }
    inner.docs = docs;
    inner.commits += 1;
    Ok(())
  }
}
