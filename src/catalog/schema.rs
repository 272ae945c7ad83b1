//! SQLite schema for the normalized track catalog.
//!
//! Artists and genres are deduplicated on `name_key`, the case-normalized form
//! of their name. Tracks are unique on `(name, artist_id, year)`, and the
//! `track_genre_artists` junction links every track to its artist and to each
//! of its genres.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LINK_ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LINK_GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true), // as first seen
        sqlite_column!("name_key", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name_key"]],
    checks: &[],
};

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("name_key", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name_key"]],
    checks: &[],
};

/// Tracks carry the cleaning predicates as CHECK constraints so a row that
/// slipped past the filter is rejected by storage too.
const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("danceability", &SqlType::Real, non_null = true),
        sqlite_column!("energy", &SqlType::Real, non_null = true),
        sqlite_column!("speechiness", &SqlType::Real, non_null = true),
        sqlite_column!("loudness", &SqlType::Real, non_null = true),
        sqlite_column!("duration_secs", &SqlType::Integer, non_null = true),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true),
        sqlite_column!("acousticness", &SqlType::Real),
        sqlite_column!("instrumentalness", &SqlType::Real),
        sqlite_column!("liveness", &SqlType::Real),
        sqlite_column!("valence", &SqlType::Real),
        sqlite_column!("tempo", &SqlType::Real),
    ],
    indices: &[
        ("idx_tracks_year", "year"),
        ("idx_tracks_artist", "artist_id"),
    ],
    unique_constraints: &[&["name", "artist_id", "year"]],
    checks: &[
        "popularity > 50 AND popularity <= 100",
        "speechiness >= 0.33 AND speechiness <= 0.66",
        "danceability > 0.2",
    ],
};

const TRACK_GENRE_ARTISTS_TABLE: Table = Table {
    name: "track_genre_artists",
    columns: &[
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LINK_ARTIST_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LINK_GENRE_FK)
        ),
    ],
    indices: &[
        ("idx_links_artist", "artist_id"),
        ("idx_links_genre", "genre_id"),
    ],
    unique_constraints: &[&["track_id", "artist_id", "genre_id"]],
    checks: &[],
};

pub const CATALOG_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        GENRES_TABLE,
        TRACKS_TABLE,
        TRACK_GENRE_ARTISTS_TABLE,
    ],
};
