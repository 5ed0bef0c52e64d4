//! Handlers for the administrator dashboards.
//!
//! Both endpoints scan every user's records and reduce them to one record per
//! chain, newest chain first. They differ only in which version represents a
//! chain.

use std::sync::Arc;

use axum::{Json, extract::State};
use safecheck_core::{StatusEngine, record::StatusRecord, resolve::Notifier, store::StatusStore};

use crate::error::ApiError;

/// `GET /admin/statuses`: a chain's current version wins over newer history.
pub async fn latest_statuses<S, N>(
  State(engine): State<Arc<StatusEngine<S, N>>>,
) -> Result<Json<Vec<StatusRecord>>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  Ok(Json(engine.all_latest_statuses().await?))
}

/// `GET /admin/history`: the newest version of each chain, whatever its state.
pub async fn history<S, N>(
  State(engine): State<Arc<StatusEngine<S, N>>>,
) -> Result<Json<Vec<StatusRecord>>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  Ok(Json(engine.status_history().await?))
}
