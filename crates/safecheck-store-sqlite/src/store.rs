//! [`SqliteStore`], the SQLite implementation of [`StatusStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, ToSql};
use safecheck_core::{
  record::{StatusRecord, StatusType},
  store::{StatusStore, WriteBatch, WriteOp},
};

use crate::{
  Error, Result,
  encode::{COLUMNS, RawStatus, encode_dt, encode_status_type},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A safecheck status store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// A [`WriteOp`] with every value already encoded for SQLite.
enum RawOp {
  Demote {
    uid:       String,
    parent_id: String,
    at:        String,
  },
  Insert(RawStatus),
  Replace(RawStatus),
}

impl RawOp {
  fn encode(op: WriteOp) -> Result<Self> {
    Ok(match op {
      WriteOp::DemoteCurrent { uid, parent_id, at } => {
        Self::Demote { uid, parent_id, at: encode_dt(&at) }
      }
      WriteOp::Insert(record) => Self::Insert(RawStatus::from_record(&record)?),
      WriteOp::Replace(record) => Self::Replace(RawStatus::from_record(&record)?),
    })
  }
}

/// Positional parameters in [`COLUMNS`] order.
fn row_params(raw: &RawStatus) -> [&dyn ToSql; 13] {
  [
    &raw.uid,
    &raw.version_id,
    &raw.parent_id,
    &raw.version,
    &raw.status_type,
    &raw.fields_json,
    &raw.created_at,
    &raw.updated_at,
    &raw.expires_at,
    &raw.retention_until,
    &raw.resolved_at,
    &raw.resolved_note,
    &raw.deleted_at,
  ]
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path.as_ref()).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = ?path.as_ref(), "opened status store");
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {COLUMNS} ...` query and decode every row.
  async fn select_many(&self, sql: String, args: Vec<String>) -> Result<Vec<StatusRecord>> {
    let raws: Vec<RawStatus> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawStatus::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatus::into_record).collect()
  }

  /// Run a `SELECT {COLUMNS} ...` query expected to match at most one row.
  async fn select_one(&self, sql: String, args: Vec<String>) -> Result<Option<StatusRecord>> {
    let raw: Option<RawStatus> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(args.iter()), RawStatus::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStatus::into_record).transpose()
  }
}

// ─── StatusStore impl ────────────────────────────────────────────────────────

impl StatusStore for SqliteStore {
  type Error = Error;

  async fn get_version(&self, uid: &str, version_id: &str) -> Result<Option<StatusRecord>> {
    self
      .select_one(
        format!("SELECT {COLUMNS} FROM statuses WHERE uid = ?1 AND version_id = ?2"),
        vec![uid.to_owned(), version_id.to_owned()],
      )
      .await
  }

  async fn find_current(&self, uid: &str) -> Result<Option<StatusRecord>> {
    self
      .select_one(
        format!(
          "SELECT {COLUMNS} FROM statuses
           WHERE uid = ?1 AND status_type = ?2
           ORDER BY created_at DESC, version DESC
           LIMIT 1"
        ),
        vec![uid.to_owned(), encode_status_type(StatusType::Current).to_owned()],
      )
      .await
  }

  async fn count_versions(&self, uid: &str, parent_id: &str) -> Result<u32> {
    let uid = uid.to_owned();
    let parent_id = parent_id.to_owned();

    let n: u32 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM statuses WHERE uid = ?1 AND parent_id = ?2",
          rusqlite::params![uid, parent_id],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n)
  }

  async fn list_chain(&self, uid: &str, parent_id: &str) -> Result<Vec<StatusRecord>> {
    self
      .select_many(
        format!(
          "SELECT {COLUMNS} FROM statuses
           WHERE uid = ?1 AND parent_id = ?2
           ORDER BY created_at DESC, version DESC"
        ),
        vec![uid.to_owned(), parent_id.to_owned()],
      )
      .await
  }

  async fn scan_all(&self) -> Result<Vec<StatusRecord>> {
    self
      .select_many(
        format!("SELECT {COLUMNS} FROM statuses WHERE status_type != ?1"),
        vec![encode_status_type(StatusType::Deleted).to_owned()],
      )
      .await
  }

  async fn commit(&self, batch: WriteBatch) -> Result<()> {
    let ops: Vec<RawOp> = batch
      .into_ops()
      .into_iter()
      .map(RawOp::encode)
      .collect::<Result<_>>()?;
    let insert_sql = format!(
      "INSERT INTO statuses ({COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    );

    // `Some` names the Replace target that was missing; the transaction is
    // dropped (rolled back) in that case.
    let missing: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for op in &ops {
          match op {
            RawOp::Demote { uid, parent_id, at } => {
              tx.execute(
                "UPDATE statuses SET status_type = 'history', updated_at = ?3
                 WHERE uid = ?1 AND parent_id = ?2 AND status_type = 'current'",
                rusqlite::params![uid, parent_id, at],
              )?;
            }
            RawOp::Insert(raw) => {
              tx.execute(&insert_sql, &row_params(raw)[..])?;
            }
            RawOp::Replace(raw) => {
              let changed = tx.execute(
                "UPDATE statuses SET
                   parent_id = ?3, version = ?4, status_type = ?5, fields_json = ?6,
                   created_at = ?7, updated_at = ?8, expires_at = ?9,
                   retention_until = ?10, resolved_at = ?11, resolved_note = ?12,
                   deleted_at = ?13
                 WHERE uid = ?1 AND version_id = ?2",
                &row_params(raw)[..],
              )?;
              if changed == 0 {
                return Ok(Some((raw.uid.clone(), raw.version_id.clone())));
              }
            }
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match missing {
      Some((uid, version_id)) => Err(Error::VersionNotFound { uid, version_id }),
      None => Ok(()),
    }
  }
}
