//! Version chain operations over a [`StatusStore`].
//!
//! A chain is every version sharing one `parent_id`. Exactly one version of a
//! live chain is `current`; promoting a new version demotes the old one in
//! the same atomic batch.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  error::require_non_blank,
  record::{StatusFields, StatusRecord, StatusType, version_id},
  retention::{compute_expires_at, compute_retention_until},
  store::{StatusStore, WriteBatch, WriteOp},
};

/// The user's current version, if any. Absence is not an error.
pub async fn get_current<S: StatusStore>(store: &S, uid: &str) -> Result<Option<StatusRecord>> {
  require_non_blank("uid", uid)?;
  store.find_current(uid).await.map_err(Error::storage)
}

/// Point read of a single version.
pub async fn get_version<S: StatusStore>(
  store: &S,
  uid: &str,
  version_id: &str,
) -> Result<Option<StatusRecord>> {
  require_non_blank("uid", uid)?;
  require_non_blank("version_id", version_id)?;
  store.get_version(uid, version_id).await.map_err(Error::storage)
}

/// Every version of a chain, newest first.
pub async fn get_chain<S: StatusStore>(
  store: &S,
  uid: &str,
  parent_id: &str,
) -> Result<Vec<StatusRecord>> {
  require_non_blank("uid", uid)?;
  require_non_blank("parent_id", parent_id)?;
  store.list_chain(uid, parent_id).await.map_err(Error::storage)
}

/// Start a new chain with `v1` as its current version.
///
/// Assigns a fresh `parent_id` and fixes the chain's `retention_until`.
pub async fn create_first<S: StatusStore>(
  store: &S,
  uid: &str,
  fields: StatusFields,
  now: DateTime<Utc>,
) -> Result<StatusRecord> {
  require_non_blank("uid", uid)?;

  let parent_id = Uuid::new_v4().hyphenated().to_string();
  let record = StatusRecord {
    uid: uid.to_owned(),
    version_id: version_id(&parent_id, 1),
    parent_id,
    version: 1,
    status_type: StatusType::Current,
    expires_at: compute_expires_at(now, fields.expiration_duration),
    retention_until: compute_retention_until(now),
    fields,
    created_at: now,
    updated_at: now,
    resolved_at: None,
    resolved_note: None,
    deleted_at: None,
  };

  store
    .commit(WriteBatch::single(WriteOp::Insert(record.clone())))
    .await
    .map_err(Error::storage)?;

  tracing::info!(uid, version_id = %record.version_id, "created status chain");
  Ok(record)
}

/// Append `v(n+1)` to the chain `parent_id` and make it current.
///
/// The demotion of the previous current version and the insertion of the new
/// one are committed as one batch. `retention_until` is inherited from the
/// demoted version; `expires_at` is recomputed from `fields`.
pub async fn append_version<S: StatusStore>(
  store: &S,
  uid: &str,
  parent_id: &str,
  fields: StatusFields,
  now: DateTime<Utc>,
) -> Result<StatusRecord> {
  require_non_blank("uid", uid)?;
  require_non_blank("parent_id", parent_id)?;

  let current = store
    .find_current(uid)
    .await
    .map_err(Error::storage)?
    .filter(|r| r.parent_id == parent_id)
    .ok_or_else(|| {
      Error::NotFound(format!("no current version in chain {parent_id} for {uid}"))
    })?;

  let n = store
    .count_versions(uid, parent_id)
    .await
    .map_err(Error::storage)?
    + 1;

  let record = StatusRecord {
    uid: uid.to_owned(),
    parent_id: parent_id.to_owned(),
    version_id: version_id(parent_id, n),
    version: n,
    status_type: StatusType::Current,
    expires_at: compute_expires_at(now, fields.expiration_duration),
    retention_until: current.retention_until,
    fields,
    created_at: now,
    updated_at: now,
    resolved_at: None,
    resolved_note: None,
    deleted_at: None,
  };

  let mut batch = WriteBatch::new();
  batch
    .push(WriteOp::DemoteCurrent {
      uid:       uid.to_owned(),
      parent_id: parent_id.to_owned(),
      at:        now,
    })
    .push(WriteOp::Insert(record.clone()));
  store.commit(batch).await.map_err(Error::storage)?;

  tracing::info!(
    uid,
    superseded = %current.version_id,
    version_id = %record.version_id,
    "appended status version"
  );
  Ok(record)
}

/// Mark the user's current version `deleted` in place.
///
/// Earlier `history` versions of the chain are kept for audit.
pub async fn delete_current<S: StatusStore>(
  store: &S,
  uid: &str,
  now: DateTime<Utc>,
) -> Result<StatusRecord> {
  let mut record = get_current(store, uid)
    .await?
    .ok_or_else(|| Error::NotFound(format!("no current status for {uid}")))?;

  record.status_type = StatusType::Deleted;
  record.deleted_at = Some(now);
  record.updated_at = now;

  store
    .commit(WriteBatch::single(WriteOp::Replace(record.clone())))
    .await
    .map_err(Error::storage)?;

  tracing::info!(uid, version_id = %record.version_id, "deleted current status");
  Ok(record)
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;
  use crate::{
    memory::MemoryStore,
    record::{Condition, version_number},
  };

  fn t0() -> DateTime<Utc> { Utc::now() }

  #[tokio::test]
  async fn create_first_starts_at_v1() {
    let store = MemoryStore::new();
    let now = t0();
    let v1 = create_first(&store, "alice", StatusFields::new(Condition::Safe), now)
      .await
      .unwrap();

    assert_eq!(v1.version, 1);
    assert_eq!(version_number(&v1.parent_id, &v1.version_id), Some(1));
    assert_eq!(v1.status_type, StatusType::Current);
    assert_eq!(v1.retention_until, compute_retention_until(now));

    let current = get_current(&store, "alice").await.unwrap().unwrap();
    assert_eq!(current, v1);
  }

  #[tokio::test]
  async fn append_demotes_previous_and_inherits_retention() {
    let store = MemoryStore::new();
    let now = t0();
    let v1 = create_first(&store, "alice", StatusFields::new(Condition::Safe), now)
      .await
      .unwrap();

    let later = now + TimeDelta::hours(3);
    let v2 = append_version(
      &store,
      "alice",
      &v1.parent_id,
      StatusFields::new(Condition::Affected),
      later,
    )
    .await
    .unwrap();

    assert_eq!(v2.version_id, format!("{}-v2", v1.parent_id));
    assert_eq!(v2.retention_until, v1.retention_until);
    assert_eq!(v2.expires_at, compute_expires_at(later, v2.fields.expiration_duration));

    let chain = get_chain(&store, "alice", &v1.parent_id).await.unwrap();
    let shape: Vec<_> = chain.iter().map(|r| (r.version, r.status_type)).collect();
    assert_eq!(shape, vec![(2, StatusType::Current), (1, StatusType::History)]);
  }

  #[tokio::test]
  async fn append_without_current_is_not_found() {
    let store = MemoryStore::new();
    let err = append_version(
      &store,
      "alice",
      "nope",
      StatusFields::new(Condition::Safe),
      t0(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(store.commit_count(), 0);
  }

  #[tokio::test]
  async fn failed_batch_leaves_chain_untouched() {
    let store = MemoryStore::new();
    let v1 = create_first(&store, "alice", StatusFields::new(Condition::Safe), t0())
      .await
      .unwrap();

    store.set_fail_writes(true);
    let err = append_version(
      &store,
      "alice",
      &v1.parent_id,
      StatusFields::new(Condition::Missing),
      t0(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    let chain = get_chain(&store, "alice", &v1.parent_id).await.unwrap();
    assert_eq!(chain, vec![v1]);
  }

  #[tokio::test]
  async fn blank_ids_are_rejected_before_reading() {
    let store = MemoryStore::new();
    assert!(matches!(get_current(&store, "  ").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(get_chain(&store, "alice", "").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(
      create_first(&store, "", StatusFields::new(Condition::Safe), t0()).await,
      Err(Error::InvalidArgument(_))
    ));
  }

  #[tokio::test]
  async fn delete_keeps_history_and_clears_current() {
    let store = MemoryStore::new();
    let v1 = create_first(&store, "alice", StatusFields::new(Condition::Safe), t0())
      .await
      .unwrap();
    append_version(
      &store,
      "alice",
      &v1.parent_id,
      StatusFields::new(Condition::Evacuated),
      t0(),
    )
    .await
    .unwrap();

    let deleted = delete_current(&store, "alice", t0()).await.unwrap();
    assert_eq!(deleted.status_type, StatusType::Deleted);
    assert!(deleted.deleted_at.is_some());

    assert!(get_current(&store, "alice").await.unwrap().is_none());
    let chain = get_chain(&store, "alice", &v1.parent_id).await.unwrap();
    assert_eq!(chain.len(), 2);

    let err = delete_current(&store, "alice", t0()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
  }
}
