//! Weighted artist rankings and their per-year trend series.
//!
//! An artist's score over a set of candidates is
//! `song_weight * normalize(song_count) + popularity_weight * normalize(avg_popularity)`,
//! where `normalize` min-max scales each metric over that candidate set.

use super::interpolation::{fill_gaps, TrendPoint};
use super::year_range::YearBounds;
use crate::catalog::SqliteTrackStore;
use crate::error::{Result, TrackStatsError};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub song_weight: f64,
    pub popularity_weight: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        RankingWeights {
            song_weight: 0.6,
            popularity_weight: 0.4,
        }
    }
}

impl RankingWeights {
    pub fn new(song_weight: f64, popularity_weight: f64) -> Result<Self> {
        let weights = RankingWeights {
            song_weight,
            popularity_weight,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Weights must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("song_weight", self.song_weight),
            ("popularity_weight", self.popularity_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackStatsError::InvalidParameter {
                    name,
                    reason: format!("must be a finite non-negative number, got {}", value),
                });
            }
        }
        let sum = self.song_weight + self.popularity_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(TrackStatsError::InvalidParameter {
                name: "song_weight",
                reason: format!("weights must sum to 1, got {}", sum),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistRanking {
    pub artist_name: String,
    pub song_count: usize,
    pub avg_popularity: f64,
    /// In `[0, 1]`.
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistTrend {
    pub artist_name: String,
    pub points: Vec<TrendPoint>,
    /// Mean of the measured (non-interpolated) yearly scores.
    pub average: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendReport {
    pub year_start: u16,
    pub year_end: u16,
    /// In ranking order over the whole range.
    pub artists: Vec<ArtistTrend>,
    /// Mean measured score of the ranked artists per year.
    pub yearly_average: Vec<TrendPoint>,
}

/// Min-max scaling of `value` into `[0, 1]`. A degenerate spread maps to 1.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let spread = max - min;
    if spread <= 0.0 {
        1.0
    } else {
        (value - min) / spread
    }
}

struct ArtistMetrics {
    artist_id: i64,
    name: String,
    song_count: usize,
    avg_popularity: f64,
}

struct ScoredArtist {
    artist_id: i64,
    ranking: ArtistRanking,
}

/// Song count and average popularity of every artist with a track in
/// `start..=end`.
fn artist_metrics(conn: &Connection, start: u16, end: u16) -> Result<Vec<ArtistMetrics>> {
    let mut stmt = conn.prepare_cached(
        "SELECT a.id, a.name, COUNT(t.id), AVG(t.popularity)
         FROM tracks t
         JOIN artists a ON a.id = t.artist_id
         WHERE t.year BETWEEN ?1 AND ?2
         GROUP BY a.id",
    )?;
    let metrics = stmt
        .query_map(params![start, end], |row| {
            Ok(ArtistMetrics {
                artist_id: row.get(0)?,
                name: row.get(1)?,
                song_count: row.get::<_, i64>(2)? as usize,
                avg_popularity: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(metrics)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn rank_order(a: &ArtistRanking, b: &ArtistRanking) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.avg_popularity.total_cmp(&a.avg_popularity))
        .then_with(|| a.artist_name.cmp(&b.artist_name))
}

/// Scores every candidate against the others, best first.
fn score_candidates(candidates: Vec<ArtistMetrics>, weights: &RankingWeights) -> Vec<ScoredArtist> {
    let (min_songs, max_songs) = min_max(candidates.iter().map(|m| m.song_count as f64));
    let (min_pop, max_pop) = min_max(candidates.iter().map(|m| m.avg_popularity));

    let mut scored: Vec<ScoredArtist> = candidates
        .into_iter()
        .map(|m| {
            let score = weights.song_weight * normalize(m.song_count as f64, min_songs, max_songs)
                + weights.popularity_weight * normalize(m.avg_popularity, min_pop, max_pop);
            ScoredArtist {
                artist_id: m.artist_id,
                ranking: ArtistRanking {
                    artist_name: m.name,
                    song_count: m.song_count,
                    avg_popularity: m.avg_popularity,
                    score,
                },
            }
        })
        .collect();
    scored.sort_by(|a, b| rank_order(&a.ranking, &b.ranking));
    scored
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(TrackStatsError::InvalidParameter {
            name: "k",
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn ranked(
    store: &SqliteTrackStore,
    bounds: &YearBounds,
    weights: &RankingWeights,
    year_start: u16,
    year_end: u16,
    k: usize,
) -> Result<Vec<ScoredArtist>> {
    bounds.check_range(year_start, year_end)?;
    check_k(k)?;
    weights.validate()?;

    let candidates = artist_metrics(store.connection(), year_start, year_end)?;
    debug!(
        "Ranking {} candidate artists for {}-{}",
        candidates.len(),
        year_start,
        year_end
    );
    let mut scored = score_candidates(candidates, weights);
    scored.truncate(k);
    Ok(scored)
}

/// The `k` best artists over `year_start..=year_end`. Ties go to the higher
/// average popularity, then to the artist name.
pub fn top_artists(
    store: &SqliteTrackStore,
    bounds: &YearBounds,
    weights: &RankingWeights,
    year_start: u16,
    year_end: u16,
    k: usize,
) -> Result<Vec<ArtistRanking>> {
    Ok(ranked(store, bounds, weights, year_start, year_end, k)?
        .into_iter()
        .map(|s| s.ranking)
        .collect())
}

/// Yearly scores of the `k` best artists of the range. Each year is scored
/// against that year's own candidates; years where an artist has no track
/// are interpolated.
pub fn artist_trends(
    store: &SqliteTrackStore,
    bounds: &YearBounds,
    weights: &RankingWeights,
    year_start: u16,
    year_end: u16,
    k: usize,
) -> Result<TrendReport> {
    let top = ranked(store, bounds, weights, year_start, year_end, k)?;
    let conn = store.connection();

    let mut measured: HashMap<i64, BTreeMap<u16, f64>> =
        top.iter().map(|s| (s.artist_id, BTreeMap::new())).collect();
    let mut yearly_sums: BTreeMap<u16, (f64, usize)> = BTreeMap::new();

    for year in year_start..=year_end {
        let candidates = artist_metrics(conn, year, year)?;
        for scored in score_candidates(candidates, weights) {
            if let Some(series) = measured.get_mut(&scored.artist_id) {
                series.insert(year, scored.ranking.score);
                let entry = yearly_sums.entry(year).or_insert((0.0, 0));
                entry.0 += scored.ranking.score;
                entry.1 += 1;
            }
        }
    }

    let artists = top
        .into_iter()
        .map(|scored| {
            let series = measured.remove(&scored.artist_id).unwrap_or_default();
            let average = mean(series.values().copied());
            ArtistTrend {
                artist_name: scored.ranking.artist_name,
                points: fill_gaps(year_start..=year_end, &series),
                average,
            }
        })
        .collect();

    let yearly_means: BTreeMap<u16, f64> = yearly_sums
        .into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect();

    Ok(TrendReport {
        year_start,
        year_end,
        artists,
        yearly_average: fill_gaps(year_start..=year_end, &yearly_means),
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::catalog_with;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(0.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize(7.0, 7.0, 7.0), 1.0);
    }

    #[test]
    fn test_weights_validation() {
        assert!(RankingWeights::new(0.5, 0.5).is_ok());
        assert!(RankingWeights::new(0.7, 0.4).is_err());
        assert!(RankingWeights::new(-0.2, 1.2).is_err());
        assert!(RankingWeights::new(f64::NAN, 0.4).is_err());
    }

    #[test]
    fn test_song_count_outweighs_single_hit() {
        let store = catalog_with(&[
            ("X1", "X", "pop", 2015, 70),
            ("X2", "X", "pop", 2015, 65),
            ("X3", "X", "pop", 2015, 75),
            ("Y1", "Y", "pop", 2015, 95),
        ]);
        let ranking = top_artists(
            &store,
            &YearBounds::default(),
            &RankingWeights::default(),
            2015,
            2015,
            2,
        )
        .unwrap();
        let names: Vec<&str> = ranking.iter().map(|r| r.artist_name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
        assert_eq!(ranking[0].song_count, 3);
        assert!((ranking[0].score - 0.6).abs() < 1e-9);
        assert!((ranking[1].score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_ties_break_on_popularity_then_name() {
        let store = catalog_with(&[
            ("A", "Beta", "pop", 2012, 80),
            ("B", "Alpha", "pop", 2012, 80),
        ]);
        let ranking = top_artists(
            &store,
            &YearBounds::default(),
            &RankingWeights::default(),
            2012,
            2012,
            5,
        )
        .unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].artist_name, "Alpha");
        assert_eq!(ranking[0].score, 1.0);
        assert_eq!(ranking[1].score, 1.0);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let store = catalog_with(&[]);
        let bounds = YearBounds::default();
        let weights = RankingWeights::default();
        assert!(matches!(
            top_artists(&store, &bounds, &weights, 2010, 2012, 0),
            Err(TrackStatsError::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            top_artists(&store, &bounds, &weights, 2012, 2010, 3),
            Err(TrackStatsError::InvalidRange(_))
        ));
        assert!(top_artists(&store, &bounds, &weights, 2010, 2012, 3)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_trends_interpolate_missing_years() {
        let store = catalog_with(&[
            ("A1", "Ann", "pop", 2010, 90),
            ("A2", "Ann", "pop", 2012, 90),
            ("B1", "Bob", "pop", 2010, 60),
            ("B2", "Bob", "pop", 2011, 60),
            ("B3", "Bob", "pop", 2012, 60),
        ]);
        let report = artist_trends(
            &store,
            &YearBounds::default(),
            &RankingWeights::default(),
            2010,
            2012,
            2,
        )
        .unwrap();
        assert_eq!(report.artists.len(), 2);

        let ann = report
            .artists
            .iter()
            .find(|a| a.artist_name == "Ann")
            .unwrap();
        let flags: Vec<bool> = ann.points.iter().map(|p| p.interpolated).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(ann.points[1].score, 1.0);
        assert_eq!(ann.average, Some(1.0));

        let bob = report
            .artists
            .iter()
            .find(|a| a.artist_name == "Bob")
            .unwrap();
        assert!(bob.points.iter().all(|p| !p.interpolated));
        // alone in 2011, so he scores 1 there
        assert_eq!(bob.points[1].score, 1.0);
        assert!((bob.points[0].score - 0.6).abs() < 1e-9);

        assert_eq!(report.yearly_average.len(), 3);
        assert!(report.yearly_average.iter().all(|p| !p.interpolated));
        assert!((report.yearly_average[0].score - 0.8).abs() < 1e-9);
    }
}
