//! plants-api - a small HTTP CRUD service for plant care records
//!
//! - Five JSON endpoints over a single `plants` table
//! - PostgreSQL in production, SQLite for local runs and tests
//! - Structured logging with optional OTLP span export

pub mod api;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
