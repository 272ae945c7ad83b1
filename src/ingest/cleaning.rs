//! Value-range filter applied to raw records before they are loaded.

use super::record::RawTrackRecord;
use serde::Serialize;

pub const MIN_POPULARITY_EXCLUSIVE: f64 = 50.0;
pub const MIN_SPEECHINESS: f64 = 0.33;
pub const MAX_SPEECHINESS: f64 = 0.66;
pub const MIN_DANCEABILITY_EXCLUSIVE: f64 = 0.2;

/// True when the record is popular, moderately speechy and danceable. A
/// missing or unparseable predicate field fails the filter.
pub fn passes_filter(record: &RawTrackRecord) -> bool {
    let popular = record
        .popularity_value()
        .is_some_and(|p| p > MIN_POPULARITY_EXCLUSIVE);
    let speechy = record
        .speechiness_value()
        .is_some_and(|s| (MIN_SPEECHINESS..=MAX_SPEECHINESS).contains(&s));
    let danceable = record
        .danceability_value()
        .is_some_and(|d| d > MIN_DANCEABILITY_EXCLUSIVE);
    popular && speechy && danceable
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub kept: usize,
    pub dropped: usize,
}

/// Lazy, order-preserving filter over raw records.
pub struct Clean<I> {
    inner: I,
    stats: CleaningStats,
}

impl<I> Clean<I> {
    /// Counts of records seen so far.
    pub fn stats(&self) -> CleaningStats {
        self.stats
    }
}

impl<I: Iterator<Item = RawTrackRecord>> Iterator for Clean<I> {
    type Item = RawTrackRecord;

    fn next(&mut self) -> Option<RawTrackRecord> {
        for record in self.inner.by_ref() {
            if passes_filter(&record) {
                self.stats.kept += 1;
                return Some(record);
            }
            self.stats.dropped += 1;
        }
        None
    }
}

pub fn clean<I: IntoIterator<Item = RawTrackRecord>>(records: I) -> Clean<I::IntoIter> {
    Clean {
        inner: records.into_iter(),
        stats: CleaningStats::default(),
    }
}
