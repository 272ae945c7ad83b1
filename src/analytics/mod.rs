//! Read-only statistics and rankings over a loaded catalog.

mod artist_popularity;
mod genre_stats;
mod interpolation;
mod ranking;
mod year_range;

pub use artist_popularity::{artist_genre_comparison, GenrePopularityComparison};
pub use genre_stats::{genre_stats, GenreStat, GenreStatsReport};
pub use interpolation::{fill_gaps, TrendPoint};
pub use ranking::{
    artist_trends, normalize, top_artists, ArtistRanking, ArtistTrend, RankingWeights,
    TrendReport,
};
pub use year_range::{parse_k, parse_year, YearBounds, DEFAULT_MAX_YEAR, DEFAULT_MIN_YEAR};
