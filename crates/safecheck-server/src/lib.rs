//! HTTP server wiring for safecheck.
//!
//! Holds the runtime configuration and assembles the served [`Router`]: the
//! JSON API nested under `/api`, wrapped in request tracing.

pub mod notify;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use safecheck_core::{StatusEngine, resolve::Notifier, store::StatusStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use notify::LogNotifier;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("safecheck.db") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `SAFECHECK_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite database file; a leading `~/` is expanded by the binary.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the served router for `engine`.
pub fn app<S, N>(engine: Arc<StatusEngine<S, N>>) -> Router
where
  S: StatusStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .nest("/api", safecheck_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}
