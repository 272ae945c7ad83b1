//! trackstats: loads a music track dataset into a normalized SQLite catalog
//! and derives genre statistics and artist rankings from it.

pub mod analytics;
pub mod catalog;
pub mod config;
mod error;
pub mod ingest;
pub mod sqlite_persistence;

pub use catalog::SqliteTrackStore;
pub use error::{Result, TrackStatsError};
