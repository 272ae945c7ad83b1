//! An artist's popularity compared with each genre's overall popularity.

use crate::catalog::SqliteTrackStore;
use crate::error::{Result, TrackStatsError};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenrePopularityComparison {
    pub genre: String,
    /// `None` when the artist has no tracks in this genre.
    pub artist_avg_popularity: Option<f64>,
    pub artist_track_count: usize,
    /// `None` when no track carries this genre.
    pub genre_avg_popularity: Option<f64>,
    pub artist_exceeds_genre: bool,
}

/// Compares the artist against every genre in the catalog, ordered by genre
/// name ignoring case. The artist name is matched case-insensitively.
pub fn artist_genre_comparison(
    store: &SqliteTrackStore,
    artist_name: &str,
) -> Result<Vec<GenrePopularityComparison>> {
    let artist = store
        .find_artist(artist_name)?
        .ok_or_else(|| TrackStatsError::ArtistNotFound(artist_name.trim().to_string()))?;
    let conn = store.connection();

    let genre_avgs = popularity_by_genre(conn, None)?;
    let artist_avgs = popularity_by_genre(conn, Some(artist.id))?;

    let mut genres = store.list_genres()?;
    genres.sort_by(|a, b| {
        a.name_key
            .cmp(&b.name_key)
            .then_with(|| a.name.cmp(&b.name))
    });

    let comparisons = genres
        .into_iter()
        .map(|genre| {
            let genre_avg = genre_avgs.get(&genre.id).map(|(avg, _)| *avg);
            let (artist_avg, artist_track_count) = match artist_avgs.get(&genre.id) {
                Some((avg, count)) => (Some(*avg), *count),
                None => (None, 0),
            };
            let artist_exceeds_genre = matches!(
                (artist_avg, genre_avg),
                (Some(a), Some(g)) if a > g
            );
            GenrePopularityComparison {
                genre: genre.name,
                artist_avg_popularity: artist_avg,
                artist_track_count,
                genre_avg_popularity: genre_avg,
                artist_exceeds_genre,
            }
        })
        .collect();
    Ok(comparisons)
}

/// `genre_id -> (average popularity, distinct tracks)`, optionally restricted
/// to one artist.
fn popularity_by_genre(
    conn: &Connection,
    artist_id: Option<i64>,
) -> Result<HashMap<i64, (f64, usize)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT l.genre_id, AVG(t.popularity), COUNT(t.id)
         FROM (SELECT DISTINCT track_id, genre_id FROM track_genre_artists) l
         JOIN tracks t ON t.id = l.track_id
         WHERE ?1 IS NULL OR t.artist_id = ?1
         GROUP BY l.genre_id",
    )?;
    let averages = stmt
        .query_map(params![artist_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                (row.get::<_, f64>(1)?, row.get::<_, i64>(2)? as usize),
            ))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(averages)
}
