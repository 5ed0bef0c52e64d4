//! Handlers for per-user `/statuses` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/statuses/:uid` | Body: editable fields; 201 + new version, or 200 `{"unchanged":true,...}` |
//! | `GET`    | `/statuses/:uid/current` | 404 if the user has no current status |
//! | `DELETE` | `/statuses/:uid/current` | 204; history is kept |
//! | `GET`    | `/statuses/:uid/versions/:version_id` | Single version, any lifecycle state |
//! | `POST`   | `/statuses/:uid/versions/:version_id/resolve` | Body: `{"note":"..."}` |
//! | `GET`    | `/statuses/:uid/chains/:parent_id` | Every version, newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use safecheck_core::{
  StatusEngine, SubmitOutcome,
  record::StatusRecord,
  resolve::Notifier,
  store::StatusStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ApiError, wire};

type Engine<S, N> = State<Arc<StatusEngine<S, N>>>;

// ─── Submit ──────────────────────────────────────────────────────────────────

/// Body returned when a submission changed nothing.
#[derive(Debug, Serialize)]
pub struct UnchangedBody {
  pub unchanged: bool,
  pub reason:    &'static str,
  pub status:    StatusRecord,
}

/// `POST /statuses/:uid`
pub async fn submit<S, N>(
  State(engine): Engine<S, N>,
  Path(uid): Path<String>,
  Json(body): Json<Value>,
) -> Result<Response, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let patch = wire::patch_from_json(&body)?;
  let response = match engine.submit(&uid, &patch).await? {
    SubmitOutcome::Created(record) => (StatusCode::CREATED, Json(record)).into_response(),
    SubmitOutcome::Unchanged { reason, current } => Json(UnchangedBody {
      unchanged: true,
      reason,
      status: current,
    })
    .into_response(),
  };
  Ok(response)
}

// ─── Current ─────────────────────────────────────────────────────────────────

/// `GET /statuses/:uid/current`
pub async fn get_current<S, N>(
  State(engine): Engine<S, N>,
  Path(uid): Path<String>,
) -> Result<Json<StatusRecord>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let record = engine
    .current(&uid)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no current status for {uid}")))?;
  Ok(Json(record))
}

/// `DELETE /statuses/:uid/current`
pub async fn delete_current<S, N>(
  State(engine): Engine<S, N>,
  Path(uid): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  engine.delete_current(&uid).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// `GET /statuses/:uid/versions/:version_id`
pub async fn get_version<S, N>(
  State(engine): Engine<S, N>,
  Path((uid, version_id)): Path<(String, String)>,
) -> Result<Json<StatusRecord>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let record = engine
    .version(&uid, &version_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("status version {version_id} for {uid}")))?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  #[serde(default)]
  pub note: String,
}

/// `POST /statuses/:uid/versions/:version_id/resolve`: body `{"note":"..."}`.
pub async fn resolve<S, N>(
  State(engine): Engine<S, N>,
  Path((uid, version_id)): Path<(String, String)>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<StatusRecord>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let record = engine.resolve(&uid, &version_id, &body.note).await?;
  Ok(Json(record))
}

// ─── Chains ──────────────────────────────────────────────────────────────────

/// `GET /statuses/:uid/chains/:parent_id`
pub async fn get_chain<S, N>(
  State(engine): Engine<S, N>,
  Path((uid, parent_id)): Path<(String, String)>,
) -> Result<Json<Vec<StatusRecord>>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let chain = engine.chain(&uid, &parent_id).await?;
  if chain.is_empty() {
    return Err(ApiError::NotFound(format!("chain {parent_id} for {uid}")));
  }
  Ok(Json(chain))
}
