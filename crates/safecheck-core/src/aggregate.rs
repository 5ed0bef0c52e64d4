//! Cross-user aggregation: one representative version per chain.
//!
//! Both reductions are pure functions over a snapshot returned by
//! [`StatusStore::scan_all`](crate::store::StatusStore::scan_all); nothing is
//! cached between calls.
//!
//! Two tie-break policies:
//!
//! - [`Policy::PriorityLatest`] backs the admin "all latest statuses" view. A
//!   `current` version always beats a non-current one; otherwise the newer
//!   version wins only when both share a `status_type`.
//! - [`Policy::PureLatest`] backs the "status history" view and keeps the
//!   newest version regardless of `status_type`.
//!
//! They can pick different representatives for the same chain, e.g. when a
//! resolved head is newer than a history row seen first.

use std::collections::{HashMap, hash_map::Entry};

use crate::record::{StatusRecord, StatusType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
  PriorityLatest,
  PureLatest,
}

impl Policy {
  /// Whether `incoming` should replace `existing` as its chain's
  /// representative.
  pub fn prefers(self, existing: &StatusRecord, incoming: &StatusRecord) -> bool {
    // Versions of one chain written in the same millisecond order by number.
    let newer = (incoming.created_millis(), incoming.version)
      > (existing.created_millis(), existing.version);
    match self {
      Self::PriorityLatest => {
        let incoming_current = incoming.status_type == StatusType::Current;
        let existing_current = existing.status_type == StatusType::Current;
        (incoming_current && !existing_current)
          || (incoming.status_type == existing.status_type && newer)
      }
      Self::PureLatest => newer,
    }
  }
}

/// Group by `parent_id`, keep one record per group under `policy`, and sort
/// newest first. Equal creation times fall back to `parent_id` order so the
/// output is deterministic.
pub fn reduce<I>(records: I, policy: Policy) -> Vec<StatusRecord>
where
  I: IntoIterator<Item = StatusRecord>,
{
  let mut by_parent: HashMap<String, StatusRecord> = HashMap::new();
  for record in records {
    match by_parent.entry(record.parent_id.clone()) {
      Entry::Occupied(mut slot) => {
        if policy.prefers(slot.get(), &record) {
          slot.insert(record);
        }
      }
      Entry::Vacant(slot) => {
        slot.insert(record);
      }
    }
  }

  let mut out: Vec<StatusRecord> = by_parent.into_values().collect();
  out.sort_by(|a, b| {
    b.created_millis()
      .cmp(&a.created_millis())
      .then_with(|| a.parent_id.cmp(&b.parent_id))
  });
  out
}

/// Priority-latest reduction.
pub fn all_latest_statuses<I>(records: I) -> Vec<StatusRecord>
where
  I: IntoIterator<Item = StatusRecord>,
{
  reduce(records, Policy::PriorityLatest)
}

/// Pure-latest reduction.
pub fn status_history<I>(records: I) -> Vec<StatusRecord>
where
  I: IntoIterator<Item = StatusRecord>,
{
  reduce(records, Policy::PureLatest)
}
