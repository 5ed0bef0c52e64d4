//! Expiry and retention deadlines.

use chrono::{DateTime, TimeDelta, Utc};

use crate::record::ExpirationDuration;

/// How long a chain is kept after its first version before it becomes
/// eligible for purge.
pub const RETENTION_DAYS: i64 = 30;

/// When a version stops being shown: `base + duration`.
pub fn compute_expires_at(
  base: DateTime<Utc>,
  duration: ExpirationDuration,
) -> DateTime<Utc> {
  base + TimeDelta::hours(duration.hours())
}

/// Purge deadline for a chain. Computed once from v1's creation time and
/// copied unchanged into every later version.
pub fn compute_retention_until(chain_created_at: DateTime<Utc>) -> DateTime<Utc> {
  chain_created_at + TimeDelta::days(RETENTION_DAYS)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn expiry_follows_chosen_duration() {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
    assert_eq!(
      compute_expires_at(base, ExpirationDuration::Hours12),
      Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
    );
    assert_eq!(
      compute_expires_at(base, ExpirationDuration::Hours24),
      Utc.with_ymd_and_hms(2024, 5, 2, 6, 0, 0).unwrap()
    );
  }

  #[test]
  fn retention_is_thirty_days() {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    assert_eq!(
      compute_retention_until(created),
      Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap()
    );
  }
}
