//! Status records, the unit of storage in safecheck.
//!
//! Every submission that changes something becomes a new immutable version in
//! the submitting user's chain. Only the lifecycle columns (`status_type`,
//! `resolved_*`, `deleted_at`, `updated_at`) of an existing version are ever
//! rewritten.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, timestamp};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The safety condition a resident reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
  Safe,
  Evacuated,
  Affected,
  Missing,
}

impl Condition {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Safe => "safe",
      Self::Evacuated => "evacuated",
      Self::Affected => "affected",
      Self::Missing => "missing",
    }
  }
}

impl FromStr for Condition {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "safe" => Ok(Self::Safe),
      "evacuated" => Ok(Self::Evacuated),
      "affected" => Ok(Self::Affected),
      "missing" => Ok(Self::Missing),
      other => Err(Error::InvalidArgument(format!("unknown condition: {other:?}"))),
    }
  }
}

/// Where a version sits in its chain's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
  /// The single active version of a chain.
  Current,
  /// Superseded by a later version; kept for audit.
  History,
  /// Closed by an administrator. Terminal.
  Resolved,
  /// Withdrawn by its owner. Terminal.
  Deleted,
}

impl StatusType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Current => "current",
      Self::History => "history",
      Self::Resolved => "resolved",
      Self::Deleted => "deleted",
    }
  }

  /// `true` for the states that mark the head of a chain.
  pub fn is_head(self) -> bool { matches!(self, Self::Current | Self::Resolved) }
}

impl fmt::Display for StatusType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StatusType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "current" => Ok(Self::Current),
      "history" => Ok(Self::History),
      "resolved" => Ok(Self::Resolved),
      "deleted" => Ok(Self::Deleted),
      other => Err(Error::InvalidArgument(format!("unknown status type: {other:?}"))),
    }
  }
}

/// How long a posted status stays visible. Serialised as the hour count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ExpirationDuration {
  Hours12,
  #[default]
  Hours24,
}

impl ExpirationDuration {
  pub fn hours(self) -> i64 {
    match self {
      Self::Hours12 => 12,
      Self::Hours24 => 24,
    }
  }
}

impl TryFrom<u32> for ExpirationDuration {
  type Error = Error;

  fn try_from(hours: u32) -> Result<Self> {
    match hours {
      12 => Ok(Self::Hours12),
      24 => Ok(Self::Hours24),
      other => Err(Error::InvalidArgument(format!(
        "expiration duration must be 12 or 24 hours, got {other}"
      ))),
    }
  }
}

impl From<ExpirationDuration> for u32 {
  fn from(d: ExpirationDuration) -> Self {
    match d {
      ExpirationDuration::Hours12 => 12,
      ExpirationDuration::Hours24 => 24,
    }
  }
}

// ─── Editable fields ─────────────────────────────────────────────────────────

fn default_people() -> u32 { 1 }

/// Everything a resident may change about their status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFields {
  pub condition:           Condition,
  pub location:            Option<String>,
  pub lat:                 Option<f64>,
  pub lng:                 Option<f64>,
  #[serde(default)]
  pub note:                String,
  /// URL supplied by the image collaborator; never fetched here.
  #[serde(default)]
  pub image:               String,
  #[serde(default)]
  pub category:            BTreeSet<String>,
  #[serde(default = "default_people")]
  pub people:              u32,
  #[serde(default)]
  pub share_location:      bool,
  #[serde(default)]
  pub share_contact:       bool,
  #[serde(default)]
  pub phone_number:        String,
  #[serde(default)]
  pub expiration_duration: ExpirationDuration,
}

impl StatusFields {
  /// Fields with every optional value at its default.
  pub fn new(condition: Condition) -> Self {
    Self {
      condition,
      location: None,
      lat: None,
      lng: None,
      note: String::new(),
      image: String::new(),
      category: BTreeSet::new(),
      people: default_people(),
      share_location: false,
      share_contact: false,
      phone_number: String::new(),
      expiration_duration: ExpirationDuration::default(),
    }
  }
}

// ─── Incoming payload ────────────────────────────────────────────────────────

/// The editable keys a caller actually sent.
///
/// `None` means the key was absent. The nullable fields nest a second
/// `Option` so an explicit `null` (clear the value) is distinguishable from
/// absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPatch {
  pub condition:           Option<Condition>,
  pub location:            Option<Option<String>>,
  pub lat:                 Option<Option<f64>>,
  pub lng:                 Option<Option<f64>>,
  pub note:                Option<String>,
  pub image:               Option<String>,
  pub category:            Option<BTreeSet<String>>,
  pub people:              Option<u32>,
  pub share_location:      Option<bool>,
  pub share_contact:       Option<bool>,
  pub phone_number:        Option<String>,
  pub expiration_duration: Option<ExpirationDuration>,
}

impl StatusPatch {
  /// Overlay the present keys onto `base`.
  pub fn apply_to(&self, base: &StatusFields) -> StatusFields {
    let mut out = base.clone();
    if let Some(v) = self.condition {
      out.condition = v;
    }
    if let Some(v) = &self.location {
      out.location.clone_from(v);
    }
    if let Some(v) = self.lat {
      out.lat = v;
    }
    if let Some(v) = self.lng {
      out.lng = v;
    }
    if let Some(v) = &self.note {
      out.note.clone_from(v);
    }
    if let Some(v) = &self.image {
      out.image.clone_from(v);
    }
    if let Some(v) = &self.category {
      out.category.clone_from(v);
    }
    if let Some(v) = self.people {
      out.people = v;
    }
    if let Some(v) = self.share_location {
      out.share_location = v;
    }
    if let Some(v) = self.share_contact {
      out.share_contact = v;
    }
    if let Some(v) = &self.phone_number {
      out.phone_number.clone_from(v);
    }
    if let Some(v) = self.expiration_duration {
      out.expiration_duration = v;
    }
    out
  }

  /// Fields for the first version of a new chain. `condition` is required
  /// because there is nothing to inherit it from.
  pub fn to_first_fields(&self) -> Result<StatusFields> {
    let condition = self.condition.ok_or_else(|| {
      Error::InvalidArgument("condition is required for a first submission".into())
    })?;
    Ok(self.apply_to(&StatusFields::new(condition)))
  }
}

impl From<StatusFields> for StatusPatch {
  /// A patch that names every editable key.
  fn from(f: StatusFields) -> Self {
    Self {
      condition:           Some(f.condition),
      location:            Some(f.location),
      lat:                 Some(f.lat),
      lng:                 Some(f.lng),
      note:                Some(f.note),
      image:               Some(f.image),
      category:            Some(f.category),
      people:              Some(f.people),
      share_location:      Some(f.share_location),
      share_contact:       Some(f.share_contact),
      phone_number:        Some(f.phone_number),
      expiration_duration: Some(f.expiration_duration),
    }
  }
}

// ─── Version ids ─────────────────────────────────────────────────────────────

/// `"{parent_id}-v{n}"`.
pub fn version_id(parent_id: &str, n: u32) -> String { format!("{parent_id}-v{n}") }

/// The `n` suffix of a version id belonging to `parent_id`, if well formed.
pub fn version_number(parent_id: &str, version_id: &str) -> Option<u32> {
  version_id
    .strip_prefix(parent_id)?
    .strip_prefix("-v")?
    .parse()
    .ok()
}

// ─── StatusRecord ────────────────────────────────────────────────────────────

/// One version of a user's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
  pub uid:             String,
  /// Identifies the chain; shared by every version.
  pub parent_id:       String,
  pub version_id:      String,
  /// The `n` in `version_id`.
  pub version:         u32,
  pub status_type:     StatusType,
  #[serde(flatten)]
  pub fields:          StatusFields,
  #[serde(with = "timestamp::lenient")]
  pub created_at:      DateTime<Utc>,
  #[serde(with = "timestamp::lenient")]
  pub updated_at:      DateTime<Utc>,
  #[serde(with = "timestamp::lenient")]
  pub expires_at:      DateTime<Utc>,
  /// Fixed when the chain is created; copied into every later version.
  #[serde(with = "timestamp::lenient")]
  pub retention_until: DateTime<Utc>,
  #[serde(default, with = "timestamp::lenient_option")]
  pub resolved_at:     Option<DateTime<Utc>>,
  #[serde(default)]
  pub resolved_note:   Option<String>,
  #[serde(default, with = "timestamp::lenient_option")]
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl StatusRecord {
  /// Comparable creation time in epoch milliseconds.
  pub fn created_millis(&self) -> timestamp::EpochMillis {
    self.created_at.timestamp_millis()
  }
}
