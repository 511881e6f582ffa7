//! # opsdesk-core
//!
//! Core library for opsdesk - the tabular reconciliation engine behind an
//! internal creator-operations console. It ingests loosely formatted
//! spreadsheet uploads into typed DuckDB tables and runs the edit/save cycle
//! (export a filtered snapshot, edit the working copy, diff against the
//! baseline, apply the minimal change-set back to the live table).
//!
//! This crate provides the core functionality so different interfaces
//! (CLI, web console, etc.) can share one engine.

pub mod apply;
pub mod config;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod registry;
pub mod schema;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod submission;
pub mod value;

// Re-export the most commonly used types for convenience
pub use apply::ApplyResult;
pub use config::Config;
pub use diff::ChangeBatch;
pub use error::{OpsdeskError, Result};
pub use ingest::IngestResult;
pub use schema::IngestMode;
pub use session::Session;
pub use snapshot::{EditTarget, Snapshot, SnapshotFilter};
pub use store::{Row, Store};
pub use value::Value;
