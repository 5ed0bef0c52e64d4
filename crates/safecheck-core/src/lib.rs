//! Core types, trait definitions and the versioned status engine for
//! safecheck.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::StatusStore`]; delivery channels
//! implement [`resolve::Notifier`].

pub mod aggregate;
pub mod chain;
pub mod engine;
pub mod error;
pub mod memory;
pub mod record;
pub mod resolve;
pub mod retention;
pub mod store;
pub mod timestamp;
pub mod update;

pub use engine::{StatusEngine, SubmitOutcome};
pub use error::{Error, Result};
