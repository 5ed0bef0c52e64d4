//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored in the canonical form produced by
//! [`safecheck_core::timestamp::format`] and read back through
//! [`safecheck_core::timestamp::parse_iso`]. Editable fields are stored as
//! compact JSON.

use chrono::{DateTime, Utc};
use safecheck_core::{
  record::{StatusFields, StatusRecord, StatusType},
  timestamp,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: &DateTime<Utc>) -> String { timestamp::format(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  timestamp::parse_iso(s)
    .map(timestamp::from_millis)
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── StatusType ──────────────────────────────────────────────────────────────

pub fn encode_status_type(t: StatusType) -> &'static str { t.as_str() }

pub fn decode_status_type(s: &str) -> Result<StatusType> {
  s.parse().map_err(|e: safecheck_core::Error| Error::Decode(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStatus`] field order.
pub const COLUMNS: &str = "uid, version_id, parent_id, version, status_type, fields_json,
  created_at, updated_at, expires_at, retention_until,
  resolved_at, resolved_note, deleted_at";

/// Raw values read from or written to a `statuses` row.
pub struct RawStatus {
  pub uid:             String,
  pub version_id:      String,
  pub parent_id:       String,
  pub version:         u32,
  pub status_type:     String,
  pub fields_json:     String,
  pub created_at:      String,
  pub updated_at:      String,
  pub expires_at:      String,
  pub retention_until: String,
  pub resolved_at:     Option<String>,
  pub resolved_note:   Option<String>,
  pub deleted_at:      Option<String>,
}

impl RawStatus {
  /// Read a row selected with [`COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:             row.get(0)?,
      version_id:      row.get(1)?,
      parent_id:       row.get(2)?,
      version:         row.get(3)?,
      status_type:     row.get(4)?,
      fields_json:     row.get(5)?,
      created_at:      row.get(6)?,
      updated_at:      row.get(7)?,
      expires_at:      row.get(8)?,
      retention_until: row.get(9)?,
      resolved_at:     row.get(10)?,
      resolved_note:   row.get(11)?,
      deleted_at:      row.get(12)?,
    })
  }

  pub fn from_record(r: &StatusRecord) -> Result<Self> {
    Ok(Self {
      uid:             r.uid.clone(),
      version_id:      r.version_id.clone(),
      parent_id:       r.parent_id.clone(),
      version:         r.version,
      status_type:     encode_status_type(r.status_type).to_owned(),
      fields_json:     serde_json::to_string(&r.fields)?,
      created_at:      encode_dt(&r.created_at),
      updated_at:      encode_dt(&r.updated_at),
      expires_at:      encode_dt(&r.expires_at),
      retention_until: encode_dt(&r.retention_until),
      resolved_at:     r.resolved_at.as_ref().map(encode_dt),
      resolved_note:   r.resolved_note.clone(),
      deleted_at:      r.deleted_at.as_ref().map(encode_dt),
    })
  }

  pub fn into_record(self) -> Result<StatusRecord> {
    let fields: StatusFields = serde_json::from_str(&self.fields_json)?;
    Ok(StatusRecord {
      uid: self.uid,
      parent_id: self.parent_id,
      version_id: self.version_id,
      version: self.version,
      status_type: decode_status_type(&self.status_type)?,
      fields,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      expires_at: decode_dt(&self.expires_at)?,
      retention_until: decode_dt(&self.retention_until)?,
      resolved_at: self.resolved_at.as_deref().map(decode_dt).transpose()?,
      resolved_note: self.resolved_note,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
