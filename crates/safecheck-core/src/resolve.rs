//! Resolution: the administrator's terminal `current → resolved` transition.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Error, Result, chain,
  record::{StatusRecord, StatusType},
  store::{StatusStore, WriteBatch, WriteOp},
};

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// Delivers "your status was resolved" messages to the owning user.
pub trait Notifier: Send + Sync {
  fn send_resolved<'a>(
    &'a self,
    uid: &'a str,
    version_id: &'a str,
    note: &'a str,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send + 'a;
}

/// A notifier that delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  async fn send_resolved(&self, _uid: &str, _version_id: &str, _note: &str) -> Result<(), NotifyError> {
    Ok(())
  }
}

/// Resolve `(uid, version_id)` in place, then notify the owner.
///
/// Only a `current` version can be resolved; anything else fails with
/// [`Error::InvariantViolation`] before any write. Notification is
/// best-effort: a delivery failure is logged and the resolved record is still
/// returned.
pub async fn resolve<S, N>(
  store: &S,
  notifier: &N,
  uid: &str,
  version_id: &str,
  note: &str,
  now: DateTime<Utc>,
) -> Result<StatusRecord>
where
  S: StatusStore,
  N: Notifier,
{
  let mut record = chain::get_version(store, uid, version_id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("status version {version_id} for {uid}")))?;

  if record.status_type != StatusType::Current {
    return Err(Error::InvariantViolation(format!(
      "version {version_id} is {}; only current versions can be resolved",
      record.status_type
    )));
  }

  record.status_type = StatusType::Resolved;
  record.resolved_note = Some(note.to_owned());
  record.resolved_at = Some(now);
  record.updated_at = now;

  store
    .commit(WriteBatch::single(WriteOp::Replace(record.clone())))
    .await
    .map_err(Error::storage)?;
  tracing::info!(uid, version_id, "resolved status");

  if let Err(e) = notifier.send_resolved(uid, version_id, note).await {
    tracing::warn!(uid, version_id, error = %e, "resolution notification failed");
  }

  Ok(record)
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    memory::MemoryStore,
    record::{Condition, StatusFields},
  };

  #[derive(Default)]
  struct FailingNotifier {
    attempts: AtomicUsize,
  }

  impl Notifier for FailingNotifier {
    async fn send_resolved(&self, _uid: &str, _version_id: &str, _note: &str) -> Result<(), NotifyError> {
      self.attempts.fetch_add(1, Ordering::SeqCst);
      Err("push gateway unreachable".into())
    }
  }

  #[tokio::test]
  async fn notification_failure_does_not_fail_resolution() {
    let store = MemoryStore::new();
    let v1 = chain::create_first(&store, "alice", StatusFields::new(Condition::Missing), Utc::now())
      .await
      .unwrap();
    let notifier = FailingNotifier::default();

    let resolved = resolve(&store, &notifier, "alice", &v1.version_id, "Found", Utc::now())
      .await
      .unwrap();

    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(resolved.status_type, StatusType::Resolved);
    let stored = store.get_version("alice", &v1.version_id).await.unwrap().unwrap();
    assert_eq!(stored, resolved);
  }

  #[tokio::test]
  async fn resolving_twice_is_an_invariant_violation_without_write() {
    let store = MemoryStore::new();
    let v1 = chain::create_first(&store, "alice", StatusFields::new(Condition::Safe), Utc::now())
      .await
      .unwrap();
    resolve(&store, &NoopNotifier, "alice", &v1.version_id, "ok", Utc::now())
      .await
      .unwrap();
    let commits = store.commit_count();

    let err = resolve(&store, &NoopNotifier, "alice", &v1.version_id, "again", Utc::now())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
    assert_eq!(store.commit_count(), commits);
  }

  #[tokio::test]
  async fn missing_version_is_not_found() {
    let store = MemoryStore::new();
    let err = resolve(&store, &NoopNotifier, "alice", "ghost-v1", "x", Utc::now())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
  }

  #[tokio::test]
  async fn storage_failure_skips_notification() {
    let store = MemoryStore::new();
    let v1 = chain::create_first(&store, "alice", StatusFields::new(Condition::Safe), Utc::now())
      .await
      .unwrap();
    store.set_fail_writes(true);
    let notifier = FailingNotifier::default();

    let err = resolve(&store, &notifier, "alice", &v1.version_id, "x", Utc::now())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 0);
  }
}
