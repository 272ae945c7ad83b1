//! Raw source rows and their conversion into typed tracks.

use crate::catalog::{normalize_name_key, NewTrack};
use crate::error::{Result, TrackStatsError};
use std::collections::HashSet;

/// Columns every source must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "song",
    "artist",
    "genre",
    "year",
    "popularity",
    "danceability",
    "energy",
    "speechiness",
    "loudness",
    "duration_ms",
    "explicit",
];

/// Audio features stored when the source has them.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// Placeholder the source dataset uses for "no genre".
const EMPTY_GENRE_PLACEHOLDER: &str = "set()";

/// One source row with every field kept as trimmed text. Empty cells are
/// `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTrackRecord {
    /// 1-based line in the source, header included.
    pub line: u64,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub popularity: Option<String>,
    pub danceability: Option<String>,
    pub energy: Option<String>,
    pub speechiness: Option<String>,
    pub loudness: Option<String>,
    pub duration_ms: Option<String>,
    pub explicit: Option<String>,
    pub acousticness: Option<String>,
    pub instrumentalness: Option<String>,
    pub liveness: Option<String>,
    pub valence: Option<String>,
    pub tempo: Option<String>,
}

impl RawTrackRecord {
    pub fn new(line: u64) -> Self {
        RawTrackRecord {
            line,
            ..Default::default()
        }
    }

    /// Builds a record from `(column, value)` pairs; unknown columns are ignored.
    pub fn from_pairs(line: u64, pairs: &[(&str, &str)]) -> Self {
        let mut record = RawTrackRecord::new(line);
        for (column, value) in pairs {
            record.set_field(column, value);
        }
        record
    }

    /// Stores `value` under `column`. Returns false for columns the record
    /// does not track.
    pub fn set_field(&mut self, column: &str, value: &str) -> bool {
        let slot = match column {
            "song" => &mut self.song,
            "artist" => &mut self.artist,
            "genre" => &mut self.genre,
            "year" => &mut self.year,
            "popularity" => &mut self.popularity,
            "danceability" => &mut self.danceability,
            "energy" => &mut self.energy,
            "speechiness" => &mut self.speechiness,
            "loudness" => &mut self.loudness,
            "duration_ms" => &mut self.duration_ms,
            "explicit" => &mut self.explicit,
            "acousticness" => &mut self.acousticness,
            "instrumentalness" => &mut self.instrumentalness,
            "liveness" => &mut self.liveness,
            "valence" => &mut self.valence,
            "tempo" => &mut self.tempo,
            _ => return false,
        };
        let trimmed = value.trim();
        *slot = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        true
    }

    pub fn popularity_value(&self) -> Option<f64> {
        parse_finite(self.popularity.as_deref())
    }

    pub fn speechiness_value(&self) -> Option<f64> {
        parse_finite(self.speechiness.as_deref())
    }

    pub fn danceability_value(&self) -> Option<f64> {
        parse_finite(self.danceability.as_deref())
    }

    fn malformed(&self, field: &'static str, reason: impl Into<String>) -> TrackStatsError {
        TrackStatsError::MalformedRecord {
            line: self.line,
            field,
            reason: reason.into(),
        }
    }

    fn required<'a>(&self, field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| self.malformed(field, "is missing"))
    }

    fn required_f64(&self, field: &'static str, value: &Option<String>) -> Result<f64> {
        let raw = self.required(field, value)?;
        parse_finite(Some(raw))
            .ok_or_else(|| self.malformed(field, format!("is not a number: '{}'", raw)))
    }

    fn optional_f64(&self, field: &'static str, value: &Option<String>) -> Result<Option<f64>> {
        match value.as_deref() {
            None => Ok(None),
            Some(raw) => parse_finite(Some(raw))
                .map(Some)
                .ok_or_else(|| self.malformed(field, format!("is not a number: '{}'", raw))),
        }
    }

    fn parse_year(&self) -> Result<u16> {
        let raw = self.required("year", &self.year)?;
        raw.parse::<u16>()
            .map_err(|_| self.malformed("year", format!("is not a year: '{}'", raw)))
    }

    fn parse_popularity(&self) -> Result<i64> {
        let raw = self.required("popularity", &self.popularity)?;
        let popularity = parse_finite(Some(raw))
            .ok_or_else(|| self.malformed("popularity", format!("is not a number: '{}'", raw)))?;
        if popularity.fract() != 0.0 {
            return Err(self.malformed("popularity", format!("is not a whole number: '{}'", raw)));
        }
        if !(0.0..=100.0).contains(&popularity) {
            return Err(self.malformed("popularity", format!("{} is outside 0-100", raw)));
        }
        Ok(popularity as i64)
    }

    fn parse_explicit(&self) -> Result<bool> {
        let raw = self.required("explicit", &self.explicit)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(self.malformed("explicit", format!("is not a boolean: '{}'", raw))),
        }
    }

    /// Splits the genre cell on commas, dropping blanks, the empty-set
    /// placeholder and case-insensitive duplicates.
    fn parse_genres(&self) -> Result<Vec<String>> {
        let raw = self.required("genre", &self.genre)?;
        let mut seen = HashSet::new();
        let genres: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty() && *label != EMPTY_GENRE_PLACEHOLDER)
            .filter(|label| seen.insert(normalize_name_key(label)))
            .map(str::to_string)
            .collect();
        if genres.is_empty() {
            return Err(self.malformed("genre", "has no genre labels"));
        }
        Ok(genres)
    }

    /// Converts the record into a typed track. Any missing or unparseable
    /// field yields `MalformedRecord`.
    pub fn to_new_track(&self) -> Result<NewTrack> {
        let name = self.required("song", &self.song)?.to_string();
        let artist_name = self.required("artist", &self.artist)?;
        if normalize_name_key(artist_name).is_empty() {
            return Err(self.malformed("artist", "is blank"));
        }
        let genres = self.parse_genres()?;
        let year = self.parse_year()?;
        let popularity = self.parse_popularity()?;

        let danceability = self.required_f64("danceability", &self.danceability)?;
        if !(0.0..=1.0).contains(&danceability) {
            return Err(self.malformed("danceability", format!("{} is outside 0-1", danceability)));
        }

        let duration_ms = self.required_f64("duration_ms", &self.duration_ms)?;
        if duration_ms < 0.0 {
            return Err(self.malformed("duration_ms", "is negative"));
        }

        Ok(NewTrack {
            name,
            artist_name: artist_name.to_string(),
            genres,
            year,
            popularity,
            danceability,
            energy: self.required_f64("energy", &self.energy)?,
            speechiness: self.required_f64("speechiness", &self.speechiness)?,
            loudness: self.required_f64("loudness", &self.loudness)?,
            duration_secs: (duration_ms / 1000.0).round() as i64,
            explicit: self.parse_explicit()?,
            acousticness: self.optional_f64("acousticness", &self.acousticness)?,
            instrumentalness: self.optional_f64("instrumentalness", &self.instrumentalness)?,
            liveness: self.optional_f64("liveness", &self.liveness)?,
            valence: self.optional_f64("valence", &self.valence)?,
            tempo: self.optional_f64("tempo", &self.tempo)?,
        })
    }
}

fn parse_finite(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
