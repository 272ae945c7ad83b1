mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::CATALOG_SCHEMA;
pub use store::{ensure_schema, SqliteTrackStore};

pub(crate) use store::{insert_link_if_absent, insert_track_if_absent, row_exists, upsert_named};
