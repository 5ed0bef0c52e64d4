//! JSON REST API for safecheck.
//!
//! Exposes an axum [`Router`] backed by a [`StatusEngine`] over any
//! [`StatusStore`]. This layer is the caller that coerces wire formats; auth,
//! TLS, and transport concerns are the embedder's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", safecheck_api::api_router(engine.clone()))
//! ```

pub mod admin;
pub mod error;
pub mod statuses;
pub mod wire;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use safecheck_core::{StatusEngine, resolve::Notifier, store::StatusStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(engine: Arc<StatusEngine<S, N>>) -> Router<()>
where
  S: StatusStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Per-user chains
    .route("/statuses/{uid}", post(statuses::submit::<S, N>))
    .route(
      "/statuses/{uid}/current",
      get(statuses::get_current::<S, N>).delete(statuses::delete_current::<S, N>),
    )
    .route("/statuses/{uid}/versions/{version_id}", get(statuses::get_version::<S, N>))
    .route(
      "/statuses/{uid}/versions/{version_id}/resolve",
      post(statuses::resolve::<S, N>),
    )
    .route("/statuses/{uid}/chains/{parent_id}", get(statuses::get_chain::<S, N>))
    // Dashboards
    .route("/admin/statuses", get(admin::latest_statuses::<S, N>))
    .route("/admin/history", get(admin::history::<S, N>))
    .with_state(engine)
}
