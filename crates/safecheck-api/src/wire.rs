//! Coercion of loosely-typed submission bodies into a [`StatusPatch`].
//!
//! Form-backed clients send everything as strings, so booleans and numbers
//! are accepted either natively or as their string spelling. Keys outside the
//! editable set (including system fields such as `versionId` or
//! `statusType`) are ignored.

use std::collections::BTreeSet;

use safecheck_core::record::{Condition, ExpirationDuration, StatusPatch};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Build a patch from a JSON object body.
pub fn patch_from_json(body: &Value) -> Result<StatusPatch, ApiError> {
  let obj = body
    .as_object()
    .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".into()))?;
  patch_from_map(obj)
}

pub fn patch_from_map(obj: &Map<String, Value>) -> Result<StatusPatch, ApiError> {
  let mut patch = StatusPatch::default();

  for (key, value) in obj {
    match key.as_str() {
      "condition" => patch.condition = Some(condition(key, value)?),
      "location" => patch.location = Some(nullable(value, |v| text(key, v))?),
      "lat" => patch.lat = Some(nullable(value, |v| float(key, v))?),
      "lng" => patch.lng = Some(nullable(value, |v| float(key, v))?),
      "note" => patch.note = Some(text_or_empty(key, value)?),
      "image" => patch.image = Some(text_or_empty(key, value)?),
      "category" => patch.category = Some(category(key, value)?),
      "people" => patch.people = Some(count(key, value)?),
      "shareLocation" => patch.share_location = Some(boolean(key, value)?),
      "shareContact" => patch.share_contact = Some(boolean(key, value)?),
      "phoneNumber" => patch.phone_number = Some(text_or_empty(key, value)?),
      "expirationDuration" => patch.expiration_duration = Some(duration(key, value)?),
      _ => {}
    }
  }

  Ok(patch)
}

// ─── Field coercions ─────────────────────────────────────────────────────────

fn invalid(key: &str, expected: &str, got: &Value) -> ApiError {
  ApiError::BadRequest(format!("{key}: expected {expected}, got {got}"))
}

fn nullable<T>(
  value: &Value,
  f: impl FnOnce(&Value) -> Result<T, ApiError>,
) -> Result<Option<T>, ApiError> {
  if value.is_null() { Ok(None) } else { f(value).map(Some) }
}

fn condition(key: &str, value: &Value) -> Result<Condition, ApiError> {
  let s = value
    .as_str()
    .ok_or_else(|| invalid(key, "one of safe|evacuated|affected|missing", value))?;
  Ok(s.trim().parse()?)
}

fn text(key: &str, value: &Value) -> Result<String, ApiError> {
  value
    .as_str()
    .map(str::to_owned)
    .ok_or_else(|| invalid(key, "a string", value))
}

/// Non-nullable text: `null` clears to the empty string.
fn text_or_empty(key: &str, value: &Value) -> Result<String, ApiError> {
  Ok(nullable(value, |v| text(key, v))?.unwrap_or_default())
}

fn float(key: &str, value: &Value) -> Result<f64, ApiError> {
  let n = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  n.filter(|n| n.is_finite())
    .ok_or_else(|| invalid(key, "a finite number", value))
}

fn count(key: &str, value: &Value) -> Result<u32, ApiError> {
  let n = match value {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.trim().parse::<u64>().ok(),
    _ => None,
  };
  n.and_then(|n| u32::try_from(n).ok())
    .ok_or_else(|| invalid(key, "a non-negative integer", value))
}

fn boolean(key: &str, value: &Value) -> Result<bool, ApiError> {
  match value {
    Value::Bool(b) => Ok(*b),
    Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
    Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
    _ => Err(invalid(key, "a boolean", value)),
  }
}

fn duration(key: &str, value: &Value) -> Result<ExpirationDuration, ApiError> {
  let hours = count(key, value).map_err(|_| invalid(key, "12 or 24", value))?;
  Ok(ExpirationDuration::try_from(hours)?)
}

/// An array of strings, or a single comma-separated string.
fn category(key: &str, value: &Value) -> Result<BTreeSet<String>, ApiError> {
  let items: Vec<&str> = match value {
    Value::Null => Vec::new(),
    Value::String(s) => s.split(',').collect(),
    Value::Array(items) => items
      .iter()
      .map(|v| v.as_str().ok_or_else(|| invalid(key, "an array of strings", v)))
      .collect::<Result<_, _>>()?,
    other => return Err(invalid(key, "an array or comma-separated string", other)),
  };
  Ok(
    items
      .into_iter()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn coerces_form_strings() {
    let patch = patch_from_json(&json!({
      "condition": "affected",
      "people": "3",
      "lat": "35.5",
      "shareLocation": "true",
      "shareContact": "false",
      "expirationDuration": "12",
      "category": "water, food,,",
    }))
    .unwrap();

    assert_eq!(patch.condition, Some(Condition::Affected));
    assert_eq!(patch.people, Some(3));
    assert_eq!(patch.lat, Some(Some(35.5)));
    assert_eq!(patch.share_location, Some(true));
    assert_eq!(patch.share_contact, Some(false));
    assert_eq!(patch.expiration_duration, Some(ExpirationDuration::Hours12));
    assert_eq!(
      patch.category,
      Some(BTreeSet::from(["food".to_owned(), "water".to_owned()]))
    );
  }

  #[test]
  fn native_types_pass_through() {
    let patch = patch_from_json(&json!({
      "people": 2,
      "lng": 139.7,
      "shareContact": true,
      "expirationDuration": 24,
      "category": ["pets"],
    }))
    .unwrap();

    assert_eq!(patch.people, Some(2));
    assert_eq!(patch.lng, Some(Some(139.7)));
    assert_eq!(patch.share_contact, Some(true));
    assert_eq!(patch.expiration_duration, Some(ExpirationDuration::Hours24));
    assert_eq!(patch.category, Some(BTreeSet::from(["pets".to_owned()])));
    assert_eq!(patch.condition, None);
  }

  #[test]
  fn null_clears_and_absence_keeps() {
    let patch = patch_from_json(&json!({ "location": null, "lat": null, "note": null })).unwrap();
    assert_eq!(patch.location, Some(None));
    assert_eq!(patch.lat, Some(None));
    assert_eq!(patch.note, Some(String::new()));
    assert_eq!(patch.lng, None);
  }

  #[test]
  fn system_and_unknown_keys_are_ignored() {
    let patch = patch_from_json(&json!({
      "versionId": "p-v9",
      "statusType": "resolved",
      "createdAt": "2024-01-01T00:00:00Z",
      "favouriteColour": "teal",
    }))
    .unwrap();
    assert_eq!(patch, StatusPatch::default());
  }

  #[test]
  fn rejects_malformed_values() {
    for body in [
      json!("not an object"),
      json!({ "condition": "fine" }),
      json!({ "people": "-1" }),
      json!({ "people": 1.5 }),
      json!({ "lat": "NaN" }),
      json!({ "shareLocation": "yes" }),
      json!({ "expirationDuration": 6 }),
      json!({ "category": [1, 2] }),
    ] {
      let err = patch_from_json(&body).unwrap_err();
      assert!(matches!(err, ApiError::BadRequest(_)), "{body} gave {err:?}");
    }
  }
}
