use super::year_range::YearBounds;
use crate::catalog::{normalize_name_key, SqliteTrackStore};
use crate::error::Result;
use rusqlite::params;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenreStat {
    pub genre: String,
    pub track_count: usize,
    pub avg_popularity: f64,
    pub avg_danceability: f64,
    /// This genre's count over the sum of all genre counts for the year.
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenreStatsReport {
    pub year: u16,
    /// Distinct tracks released in the year.
    pub total_tracks: usize,
    /// By track count descending, then genre name.
    pub genres: Vec<GenreStat>,
}

impl GenreStatsReport {
    /// Case-insensitive lookup by genre name.
    pub fn get(&self, genre: &str) -> Option<&GenreStat> {
        let key = normalize_name_key(genre);
        self.genres
            .iter()
            .find(|stat| normalize_name_key(&stat.genre) == key)
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }
}

/// Per-genre track count, average popularity and danceability, and share of
/// the year's genre assignments.
pub fn genre_stats(
    store: &SqliteTrackStore,
    bounds: &YearBounds,
    year: u16,
) -> Result<GenreStatsReport> {
    bounds.check_year(year)?;
    let conn = store.connection();

    let mut stmt = conn.prepare_cached(
        "SELECT g.name, COUNT(t.id), AVG(t.popularity), AVG(t.danceability)
         FROM (SELECT DISTINCT track_id, genre_id FROM track_genre_artists) l
         JOIN tracks t ON t.id = l.track_id
         JOIN genres g ON g.id = l.genre_id
         WHERE t.year = ?1
         GROUP BY g.id
         ORDER BY COUNT(t.id) DESC, g.name_key ASC, g.name ASC",
    )?;
    let rows = stmt
        .query_map(params![year], |row| {
            Ok(GenreStat {
                genre: row.get(0)?,
                track_count: row.get::<_, i64>(1)? as usize,
                avg_popularity: row.get(2)?,
                avg_danceability: row.get(3)?,
                share: 0.0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_tracks: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tracks WHERE year = ?1",
        params![year],
        |r| r.get(0),
    )?;

    let assignments: usize = rows.iter().map(|stat| stat.track_count).sum();
    let genres = rows
        .into_iter()
        .map(|stat| GenreStat {
            share: stat.track_count as f64 / assignments as f64,
            ..stat
        })
        .collect();

    Ok(GenreStatsReport {
        year,
        total_tracks: total_tracks as usize,
        genres,
    })
}
