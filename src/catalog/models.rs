//! Catalog models mapped to the SQLite schema.

use serde::{Deserialize, Serialize};

/// Lookup key used to deduplicate artists and genres: trimmed, lower-cased,
/// runs of whitespace collapsed to one space.
pub fn normalize_name_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub name_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub name_key: String,
}

/// A typed track ready to be written, produced from a cleaned source record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTrack {
    pub name: String,
    pub artist_name: String,
    /// Distinct genre labels, in source order.
    pub genres: Vec<String>,
    pub year: u16,
    pub popularity: i64,
    pub danceability: f64,
    pub energy: f64,
    pub speechiness: f64,
    pub loudness: f64,
    pub duration_secs: i64,
    pub explicit: bool,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

/// A persisted track row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub artist_id: i64,
    pub year: u16,
    pub popularity: i64,
    pub danceability: f64,
    pub energy: f64,
    pub speechiness: f64,
    pub loudness: f64,
    pub duration_secs: i64,
    pub explicit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackGenreArtistLink {
    pub track_id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
}

/// Row counts of the four relations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub artists: usize,
    pub genres: usize,
    pub tracks: usize,
    pub links: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_key() {
        assert_eq!(normalize_name_key("Drake"), "drake");
        assert_eq!(normalize_name_key("  Lil   Wayne "), "lil wayne");
        assert_eq!(normalize_name_key("HIP HOP"), normalize_name_key("hip hop"));
    }
}
