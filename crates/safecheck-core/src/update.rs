//! Conditional updates: is a resubmission a no-op or a new version?
//!
//! Only the keys present in the incoming [`StatusPatch`] are compared, and
//! only user-editable fields exist on a patch, so system-managed fields
//! (`parentId`, `versionId`, `statusType`, timestamps, retention) never take
//! part in the decision.

use crate::{
  Result, chain,
  record::{StatusFields, StatusPatch, StatusRecord},
  store::StatusStore,
};

/// Reason attached to every [`Decision::NoOp`].
pub const NO_CHANGES: &str = "No changes detected";

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
  /// Nothing the caller sent differs from the current version.
  NoOp {
    reason:  &'static str,
    current: StatusRecord,
  },
  /// Write a new version with `fields`. `base` is the version it
  /// supersedes, or `None` when the user has no current status.
  NewVersion {
    fields: StatusFields,
    base:   Option<StatusRecord>,
  },
}

fn differs<T: PartialEq>(incoming: Option<&T>, stored: &T) -> bool {
  incoming.is_some_and(|v| v != stored)
}

/// Names of the present keys whose value differs from `current`.
pub fn changed_fields(current: &StatusFields, patch: &StatusPatch) -> Vec<&'static str> {
  let checks = [
    ("condition", differs(patch.condition.as_ref(), &current.condition)),
    ("location", differs(patch.location.as_ref(), &current.location)),
    ("lat", differs(patch.lat.as_ref(), &current.lat)),
    ("lng", differs(patch.lng.as_ref(), &current.lng)),
    ("note", differs(patch.note.as_ref(), &current.note)),
    ("image", differs(patch.image.as_ref(), &current.image)),
    ("category", differs(patch.category.as_ref(), &current.category)),
    ("people", differs(patch.people.as_ref(), &current.people)),
    ("shareLocation", differs(patch.share_location.as_ref(), &current.share_location)),
    ("shareContact", differs(patch.share_contact.as_ref(), &current.share_contact)),
    ("phoneNumber", differs(patch.phone_number.as_ref(), &current.phone_number)),
    (
      "expirationDuration",
      differs(patch.expiration_duration.as_ref(), &current.expiration_duration),
    ),
  ];
  checks
    .into_iter()
    .filter_map(|(name, changed)| changed.then_some(name))
    .collect()
}

/// Decide against an already-loaded current version.
pub fn decide_against(current: Option<StatusRecord>, patch: &StatusPatch) -> Result<Decision> {
  let Some(current) = current else {
    return Ok(Decision::NewVersion { fields: patch.to_first_fields()?, base: None });
  };

  let changed = changed_fields(&current.fields, patch);
  if changed.is_empty() {
    tracing::debug!(uid = %current.uid, version_id = %current.version_id, "{NO_CHANGES}");
    return Ok(Decision::NoOp { reason: NO_CHANGES, current });
  }

  tracing::debug!(uid = %current.uid, ?changed, "resubmission changes fields");
  Ok(Decision::NewVersion {
    fields: patch.apply_to(&current.fields),
    base:   Some(current),
  })
}

/// Load the user's current version and decide.
pub async fn decide<S: StatusStore>(store: &S, uid: &str, patch: &StatusPatch) -> Result<Decision> {
  let current = chain::get_current(store, uid).await?;
  decide_against(current, patch)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::Utc;

  use super::*;
  use crate::{
    Error,
    record::{Condition, ExpirationDuration, StatusType},
    retention::{compute_expires_at, compute_retention_until},
  };

  fn record(fields: StatusFields) -> StatusRecord {
    let now = Utc::now();
    StatusRecord {
      uid: "alice".into(),
      parent_id: "p".into(),
      version_id: "p-v1".into(),
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
    }
  }

  #[test]
  fn identical_payload_is_noop() {
    let mut fields = StatusFields::new(Condition::Safe);
    fields.category = BTreeSet::from(["water".to_owned(), "power".to_owned()]);
    fields.lat = Some(35.68);
    let current = record(fields.clone());

    let decision = decide_against(Some(current.clone()), &StatusPatch::from(fields)).unwrap();
    assert_eq!(decision, Decision::NoOp { reason: NO_CHANGES, current });
  }

  #[test]
  fn absent_keys_are_not_compared() {
    let mut fields = StatusFields::new(Condition::Safe);
    fields.note = "at the shelter".into();
    let current = record(fields);

    let patch = StatusPatch { condition: Some(Condition::Safe), ..Default::default() };
    assert!(matches!(
      decide_against(Some(current), &patch).unwrap(),
      Decision::NoOp { .. }
    ));
  }

  #[test]
  fn changed_key_produces_merged_fields() {
    let mut fields = StatusFields::new(Condition::Safe);
    fields.note = "at the shelter".into();
    fields.people = 3;
    let current = record(fields);

    let patch = StatusPatch {
      condition: Some(Condition::Affected),
      people: Some(3),
      ..Default::default()
    };
    assert_eq!(changed_fields(&current.fields, &patch), vec!["condition"]);

    let Decision::NewVersion { fields, base } = decide_against(Some(current), &patch).unwrap()
    else {
      panic!("expected a new version");
    };
    assert_eq!(fields.condition, Condition::Affected);
    assert_eq!(fields.note, "at the shelter");
    assert_eq!(fields.people, 3);
    assert_eq!(base.unwrap().version_id, "p-v1");
  }

  #[test]
  fn explicit_null_clears_location() {
    let mut fields = StatusFields::new(Condition::Evacuated);
    fields.location = Some("Gym".into());
    let current = record(fields);

    let patch = StatusPatch { location: Some(None), ..Default::default() };
    assert_eq!(changed_fields(&current.fields, &patch), vec!["location"]);
    let Decision::NewVersion { fields, .. } = decide_against(Some(current), &patch).unwrap()
    else {
      panic!("expected a new version");
    };
    assert_eq!(fields.location, None);
  }

  #[test]
  fn first_submission_requires_condition() {
    let patch = StatusPatch { people: Some(2), ..Default::default() };
    assert!(matches!(decide_against(None, &patch), Err(Error::InvalidArgument(_))));

    let patch = StatusPatch {
      condition: Some(Condition::Missing),
      expiration_duration: Some(ExpirationDuration::Hours12),
      ..Default::default()
    };
    let Decision::NewVersion { fields, base } = decide_against(None, &patch).unwrap() else {
      panic!("expected a new version");
    };
    assert!(base.is_none());
    assert_eq!(fields.condition, Condition::Missing);
    assert_eq!(fields.expiration_duration, ExpirationDuration::Hours12);
    assert_eq!(fields.people, 1);
  }
}
