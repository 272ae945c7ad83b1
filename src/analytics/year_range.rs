//! Year bounds and the validated parsers used for user-supplied arguments.

use crate::catalog::SqliteTrackStore;
use crate::error::{Result, TrackStatsError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_YEAR: u16 = 1998;
pub const DEFAULT_MAX_YEAR: u16 = 2020;

/// Inclusive range of years the analyses accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: u16,
    pub max: u16,
}

impl Default for YearBounds {
    fn default() -> Self {
        YearBounds {
            min: DEFAULT_MIN_YEAR,
            max: DEFAULT_MAX_YEAR,
        }
    }
}

impl YearBounds {
    pub fn new(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(TrackStatsError::InvalidRange(format!(
                "year bounds {}-{} are inverted",
                min, max
            )));
        }
        Ok(YearBounds { min, max })
    }

    /// Bounds spanning the years present in storage. An empty catalog falls
    /// back to the defaults.
    pub fn observed(store: &SqliteTrackStore) -> Result<Self> {
        match store.observed_year_bounds()? {
            Some((min, max)) => YearBounds::new(min, max),
            None => Ok(YearBounds::default()),
        }
    }

    pub fn contains(&self, year: u16) -> bool {
        (self.min..=self.max).contains(&year)
    }

    pub fn check_year(&self, year: u16) -> Result<u16> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(TrackStatsError::InvalidRange(format!(
                "year {} is outside {}-{}",
                year, self.min, self.max
            )))
        }
    }

    pub fn check_range(&self, start: u16, end: u16) -> Result<(u16, u16)> {
        if start > end {
            return Err(TrackStatsError::InvalidRange(format!(
                "start year {} is after end year {}",
                start, end
            )));
        }
        self.check_year(start)?;
        self.check_year(end)?;
        Ok((start, end))
    }
}

/// Parses a year argument and checks it against `bounds`.
pub fn parse_year(text: &str, bounds: &YearBounds) -> Result<u16> {
    let year: i64 = text
        .trim()
        .parse()
        .map_err(|_| TrackStatsError::InvalidParameter {
            name: "year",
            reason: format!("'{}' is not a number", text.trim()),
        })?;
    let year = u16::try_from(year).map_err(|_| {
        TrackStatsError::InvalidRange(format!(
            "year {} is outside {}-{}",
            year, bounds.min, bounds.max
        ))
    })?;
    bounds.check_year(year)
}

/// Parses the number of artists to rank. Must be a positive integer.
pub fn parse_k(text: &str) -> Result<usize> {
    let k: i64 = text
        .trim()
        .parse()
        .map_err(|_| TrackStatsError::InvalidParameter {
            name: "k",
            reason: format!("'{}' is not a number", text.trim()),
        })?;
    if k <= 0 {
        return Err(TrackStatsError::InvalidParameter {
            name: "k",
            reason: format!("must be positive, got {}", k),
        });
    }
    Ok(k as usize)
}
