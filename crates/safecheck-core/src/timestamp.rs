//! Timestamp normalisation.
//!
//! Records arriving from older clients and exports carry creation times in
//! several shapes:
//!
//! | shape | example |
//! |-------|---------|
//! | epoch milliseconds | `1714521600000` |
//! | `{seconds, nanoseconds}` | `{"seconds": 1714521600, "nanoseconds": 0}` |
//! | `{_seconds, _nanoseconds}` | `{"_seconds": 1714521600, "_nanoseconds": 0}` |
//! | ISO 8601 string | `"2024-05-01T00:00:00.000Z"`, `"2024-05-01"` |
//!
//! [`parse_timestamp`] is the one routine that understands all of them. Every
//! comparison in the crate happens on the normalised [`EpochMillis`] value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::{Error, Result};

pub type EpochMillis = i64;

/// Normalise any supported encoding to epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Result<EpochMillis> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .ok_or_else(|| invalid(value)),
    Value::String(s) => parse_iso(s),
    Value::Object(map) => {
      let seconds = map
        .get("seconds")
        .or_else(|| map.get("_seconds"))
        .and_then(as_integer)
        .ok_or_else(|| invalid(value))?;
      let nanos = map
        .get("nanoseconds")
        .or_else(|| map.get("_nanoseconds"))
        .and_then(as_integer)
        .unwrap_or(0);
      seconds
        .checked_mul(1_000)
        .and_then(|ms| ms.checked_add(nanos / 1_000_000))
        .ok_or_else(|| invalid(value))
    }
    _ => Err(invalid(value)),
  }
}

/// Parse an ISO 8601 date-time (with or without offset) or a bare date.
pub fn parse_iso(s: &str) -> Result<EpochMillis> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.timestamp_millis());
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
    return Ok(naive.and_utc().timestamp_millis());
  }
  if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
  {
    return Ok(naive.and_utc().timestamp_millis());
  }
  Err(Error::InvalidArgument(format!("unparsable timestamp: {s:?}")))
}

/// Lenient form of [`parse_timestamp`]: unparsable input becomes the epoch,
/// so it sorts after every real timestamp in a newest-first listing.
pub fn normalize(value: &Value) -> DateTime<Utc> {
  match parse_timestamp(value) {
    Ok(ms) => from_millis(ms),
    Err(e) => {
      tracing::warn!(%value, error = %e, "treating timestamp as epoch 0");
      DateTime::<Utc>::default()
    }
  }
}

/// Convert epoch milliseconds back to a `DateTime`, clamping out-of-range
/// values to the epoch.
pub fn from_millis(ms: EpochMillis) -> DateTime<Utc> {
  DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Canonical text form: RFC 3339, millisecond precision, `Z` suffix. Strings
/// in this form sort lexicographically in time order.
pub fn format(dt: &DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

fn as_integer(v: &Value) -> Option<i64> {
  v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

fn invalid(value: &Value) -> Error {
  Error::InvalidArgument(format!("unparsable timestamp: {value}"))
}

// ─── serde adapters ──────────────────────────────────────────────────────────

/// `#[serde(with = "timestamp::lenient")]` for `DateTime<Utc>` fields.
pub mod lenient {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};
  use serde_json::Value;

  pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::format(dt))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(super::normalize(&value))
  }
}

/// `#[serde(default, with = "timestamp::lenient_option")]` for optional
/// timestamps; `null` and absence both mean `None`.
pub mod lenient_option {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};
  use serde_json::Value;

  pub fn serialize<S: Serializer>(
    dt: &Option<DateTime<Utc>>,
    s: S,
  ) -> Result<S::Ok, S::Error> {
    match dt {
      Some(dt) => s.serialize_some(&super::format(dt)),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
      None | Some(Value::Null) => None,
      Some(v) => Some(super::normalize(&v)),
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  const MAY_1: EpochMillis = 1_714_521_600_000;

  #[test]
  fn all_encodings_agree() {
    let encodings = [
      json!(MAY_1),
      json!({ "seconds": 1_714_521_600, "nanoseconds": 0 }),
      json!({ "_seconds": 1_714_521_600, "_nanoseconds": 0 }),
      json!("2024-05-01T00:00:00.000Z"),
      json!("2024-05-01T09:00:00+09:00"),
      json!("2024-05-01T00:00:00"),
      json!("2024-05-01"),
    ];
    for v in encodings {
      assert_eq!(parse_timestamp(&v).unwrap(), MAY_1, "encoding: {v}");
    }
  }

  #[test]
  fn nanoseconds_contribute_millis() {
    let v = json!({ "seconds": 10, "nanoseconds": 250_000_000 });
    assert_eq!(parse_timestamp(&v).unwrap(), 10_250);
  }

  #[test]
  fn garbage_is_invalid_argument() {
    for v in [
      json!("yesterday"),
      json!(true),
      json!(null),
      json!({ "when": 1 }),
      json!({ "seconds": i64::MAX / 10 }),
      json!({ "_seconds": i64::MIN / 10, "_nanoseconds": 0 }),
    ] {
      assert!(matches!(parse_timestamp(&v), Err(Error::InvalidArgument(_))), "{v}");
    }
  }

  #[test]
  fn normalize_falls_back_to_epoch() {
    assert_eq!(normalize(&json!("not a date")).timestamp_millis(), 0);
    assert_eq!(normalize(&json!({ "seconds": i64::MAX / 10 })).timestamp_millis(), 0);
    assert_eq!(normalize(&json!(MAY_1)).timestamp_millis(), MAY_1);
  }

  #[test]
  fn canonical_format_round_trips() {
    let dt = from_millis(MAY_1 + 123);
    assert_eq!(format(&dt), "2024-05-01T00:00:00.123Z");
    assert_eq!(parse_iso(&format(&dt)).unwrap(), MAY_1 + 123);
  }
}
