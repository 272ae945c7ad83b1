//! SQLite-backed track catalog.
//!
//! `SqliteTrackStore` owns a single connection. Opening a store creates the
//! schema if absent and validates it otherwise; the connection is released
//! when the store is dropped or explicitly closed.

use super::models::*;
use super::schema::CATALOG_SCHEMA;
use crate::error::{Result, TrackStatsError};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Creates the catalog relations if they are missing and validates the
/// resulting layout. Safe to call any number of times.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let expected_version = CATALOG_SCHEMA.user_version() as i64;

    // user_version 0 means a fresh file, or one we never stamped
    if db_version != 0 && db_version != expected_version {
        return Err(TrackStatsError::Schema(format!(
            "Unsupported catalog db version {}, expected {}",
            db_version, expected_version
        )));
    }

    CATALOG_SCHEMA.create(conn).map_err(TrackStatsError::schema)?;
    CATALOG_SCHEMA
        .validate(conn)
        .map_err(TrackStatsError::schema)?;
    CATALOG_SCHEMA
        .stamp_version(conn)
        .map_err(TrackStatsError::schema)?;
    Ok(())
}

pub struct SqliteTrackStore {
    conn: Connection,
}

impl SqliteTrackStore {
    /// Open (creating if needed) the catalog database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            TrackStatsError::Schema(format!(
                "Failed to open catalog database {}: {}",
                db_path.display(),
                e
            ))
        })?;
        info!("Opened catalog database at {}", db_path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TrackStatsError::Schema(format!("Failed to open in-memory db: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        ensure_schema(&conn)?;
        let store = SqliteTrackStore { conn };
        let counts = store.counts()?;
        info!(
            "Catalog contains {} artists, {} genres, {} tracks, {} links",
            counts.artists, counts.genres, counts.tracks, counts.links
        );
        Ok(store)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| TrackStatsError::Storage(e))?;
        debug!("Catalog database closed");
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Re-runs the create-if-absent step on the open connection.
    pub fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.conn)
    }

    /// Drops every relation and recreates the schema empty.
    pub fn reset_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        CATALOG_SCHEMA.drop_all(&tx).map_err(TrackStatsError::schema)?;
        CATALOG_SCHEMA.create(&tx).map_err(TrackStatsError::schema)?;
        tx.commit()?;
        info!("Catalog schema reset");
        Ok(())
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                        r.get(0)
                    })?;
            Ok(n as usize)
        };
        Ok(TableCounts {
            artists: count("artists")?,
            genres: count("genres")?,
            tracks: count("tracks")?,
            links: count("track_genre_artists")?,
        })
    }

    /// Junction rows whose track, artist or genre does not resolve.
    pub fn orphan_link_count(&self) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM track_genre_artists l
             LEFT JOIN tracks t ON t.id = l.track_id
             LEFT JOIN artists a ON a.id = l.artist_id
             LEFT JOIN genres g ON g.id = l.genre_id
             WHERE t.id IS NULL OR a.id IS NULL OR g.id IS NULL",
            [],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    /// Smallest and largest track year, or `None` for an empty catalog.
    pub fn observed_year_bounds(&self) -> Result<Option<(u16, u16)>> {
        let bounds: (Option<i64>, Option<i64>) =
            self.conn
                .query_row("SELECT MIN(year), MAX(year) FROM tracks", [], |r| {
                    Ok((r.get(0)?, r.get(1)?))
                })?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((min as u16, max as u16)),
            _ => None,
        })
    }

    pub fn find_artist(&self, name: &str) -> Result<Option<Artist>> {
        let key = normalize_name_key(name);
        let artist = self
            .conn
            .query_row(
                "SELECT id, name, name_key FROM artists WHERE name_key = ?1",
                params![key],
                |row| {
                    Ok(Artist {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        name_key: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    pub fn list_artists(&self) -> Result<Vec<Artist>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name, name_key FROM artists ORDER BY name_key")?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    name_key: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    pub fn list_genres(&self) -> Result<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name, name_key FROM genres ORDER BY name_key")?;
        let genres = stmt
            .query_map([], |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    name_key: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    pub fn list_tracks(&self) -> Result<Vec<Track>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, artist_id, year, popularity, danceability, energy,
                    speechiness, loudness, duration_secs, explicit
             FROM tracks ORDER BY id",
        )?;
        let tracks = stmt
            .query_map([], |row| {
                Ok(Track {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    artist_id: row.get(2)?,
                    year: row.get(3)?,
                    popularity: row.get(4)?,
                    danceability: row.get(5)?,
                    energy: row.get(6)?,
                    speechiness: row.get(7)?,
                    loudness: row.get(8)?,
                    duration_secs: row.get(9)?,
                    explicit: row.get::<_, i32>(10)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    pub fn list_links(&self) -> Result<Vec<TrackGenreArtistLink>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT track_id, artist_id, genre_id FROM track_genre_artists
             ORDER BY track_id, artist_id, genre_id",
        )?;
        let links = stmt
            .query_map([], |row| {
                Ok(TrackGenreArtistLink {
                    track_id: row.get(0)?,
                    artist_id: row.get(1)?,
                    genre_id: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// `name_key -> id` for every artist.
    pub(crate) fn artist_index(&self) -> Result<HashMap<String, i64>> {
        key_index(&self.conn, "artists")
    }

    /// `name_key -> id` for every genre.
    pub(crate) fn genre_index(&self) -> Result<HashMap<String, i64>> {
        key_index(&self.conn, "genres")
    }
}

fn key_index(conn: &Connection, table: &str) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare(&format!("SELECT name_key, id FROM {}", table))?;
    let index = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(index)
}

// =============================================================================
// Write helpers, run inside a loader transaction
// =============================================================================

/// Inserts an artist or genre row unless `name_key` is taken. Returns the id
/// that owns the key and whether a new row was written.
pub(crate) fn upsert_named(
    conn: &Connection,
    table: &str,
    name: &str,
    key: &str,
) -> Result<(i64, bool)> {
    let inserted = conn.execute(
        &format!(
            "INSERT INTO {} (name, name_key) VALUES (?1, ?2) ON CONFLICT(name_key) DO NOTHING",
            table
        ),
        params![name, key],
    )?;
    let id = conn.query_row(
        &format!("SELECT id FROM {} WHERE name_key = ?1", table),
        params![key],
        |r| r.get(0),
    )?;
    Ok((id, inserted > 0))
}

/// Inserts the track unless `(name, artist_id, year)` already exists.
/// Returns the track id and whether a new row was written.
pub(crate) fn insert_track_if_absent(
    conn: &Connection,
    track: &NewTrack,
    artist_id: i64,
) -> Result<(i64, bool)> {
    let inserted = conn.execute(
        "INSERT INTO tracks (name, artist_id, year, popularity, danceability, energy,
         speechiness, loudness, duration_secs, explicit, acousticness, instrumentalness,
         liveness, valence, tempo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(name, artist_id, year) DO NOTHING",
        params![
            &track.name,
            artist_id,
            track.year,
            track.popularity,
            track.danceability,
            track.energy,
            track.speechiness,
            track.loudness,
            track.duration_secs,
            if track.explicit { 1 } else { 0 },
            track.acousticness,
            track.instrumentalness,
            track.liveness,
            track.valence,
            track.tempo,
        ],
    )?;
    let track_id = conn.query_row(
        "SELECT id FROM tracks WHERE name = ?1 AND artist_id = ?2 AND year = ?3",
        params![&track.name, artist_id, track.year],
        |r| r.get(0),
    )?;
    Ok((track_id, inserted > 0))
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let exists = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        params![id],
        |r| r.get(0),
    )?;
    Ok(exists)
}

/// Inserts a junction row unless it already exists. Returns whether a new row
/// was written.
pub(crate) fn insert_link_if_absent(conn: &Connection, link: &TrackGenreArtistLink) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO track_genre_artists (track_id, artist_id, genre_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(track_id, artist_id, genre_id) DO NOTHING",
        params![link.track_id, link.artist_id, link.genre_id],
    )?;
    Ok(inserted > 0)
}
