//! [`StatusEngine`], the entry point callers hold on to.
//!
//! Bundles a store and a notifier and stamps operations with the wall clock.
//! Every method is a thin composition of the component modules.

use chrono::Utc;

use crate::{
  Result, aggregate, chain,
  record::{StatusPatch, StatusRecord},
  resolve::{NoopNotifier, Notifier},
  store::StatusStore,
  update::{self, Decision},
};

/// What [`StatusEngine::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
  /// Nothing was written.
  Unchanged {
    reason:  &'static str,
    current: StatusRecord,
  },
  /// A new version was written and is now current.
  Created(StatusRecord),
}

pub struct StatusEngine<S, N = NoopNotifier> {
  store:    S,
  notifier: N,
}

impl<S: StatusStore> StatusEngine<S> {
  /// An engine whose resolutions notify nobody.
  pub fn without_notifications(store: S) -> Self { Self::new(store, NoopNotifier) }
}

impl<S, N> StatusEngine<S, N>
where
  S: StatusStore,
  N: Notifier,
{
  pub fn new(store: S, notifier: N) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &S { &self.store }

  pub async fn current(&self, uid: &str) -> Result<Option<StatusRecord>> {
    chain::get_current(&self.store, uid).await
  }

  pub async fn version(&self, uid: &str, version_id: &str) -> Result<Option<StatusRecord>> {
    chain::get_version(&self.store, uid, version_id).await
  }

  pub async fn chain(&self, uid: &str, parent_id: &str) -> Result<Vec<StatusRecord>> {
    chain::get_chain(&self.store, uid, parent_id).await
  }

  pub async fn decide(&self, uid: &str, patch: &StatusPatch) -> Result<Decision> {
    update::decide(&self.store, uid, patch).await
  }

  /// Decide, then write only if something changed.
  ///
  /// Same-user submissions are not serialised here; two racing requests may
  /// both read the same current version.
  pub async fn submit(&self, uid: &str, patch: &StatusPatch) -> Result<SubmitOutcome> {
    let record = match self.decide(uid, patch).await? {
      Decision::NoOp { reason, current } => {
        return Ok(SubmitOutcome::Unchanged { reason, current });
      }
      Decision::NewVersion { fields, base: None } => {
        chain::create_first(&self.store, uid, fields, Utc::now()).await?
      }
      Decision::NewVersion { fields, base: Some(base) } => {
        chain::append_version(&self.store, uid, &base.parent_id, fields, Utc::now()).await?
      }
    };
    Ok(SubmitOutcome::Created(record))
  }

  pub async fn resolve(&self, uid: &str, version_id: &str, note: &str) -> Result<StatusRecord> {
    crate::resolve::resolve(&self.store, &self.notifier, uid, version_id, note, Utc::now()).await
  }

  pub async fn delete_current(&self, uid: &str) -> Result<StatusRecord> {
    chain::delete_current(&self.store, uid, Utc::now()).await
  }

  /// Admin dashboard view; see [`aggregate::Policy::PriorityLatest`].
  pub async fn all_latest_statuses(&self) -> Result<Vec<StatusRecord>> {
    let snapshot = self.store.scan_all().await.map_err(crate::Error::storage)?;
    Ok(aggregate::all_latest_statuses(snapshot))
  }

  /// History view; see [`aggregate::Policy::PureLatest`].
  pub async fn status_history(&self) -> Result<Vec<StatusRecord>> {
    let snapshot = self.store.scan_all().await.map_err(crate::Error::storage)?;
    Ok(aggregate::status_history(snapshot))
  }
}
