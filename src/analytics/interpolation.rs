use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: u16,
    pub score: f64,
    /// False when `score` was measured, true when it was filled in.
    pub interpolated: bool,
}

/// One point per year of `years`. Years missing from `known` are linearly
/// interpolated between the nearest known neighbours; leading and trailing
/// gaps repeat the nearest known value. Returns nothing when `known` is empty.
pub fn fill_gaps(years: RangeInclusive<u16>, known: &BTreeMap<u16, f64>) -> Vec<TrendPoint> {
    if known.is_empty() {
        return Vec::new();
    }
    years
        .map(|year| {
            if let Some(&score) = known.get(&year) {
                return TrendPoint {
                    year,
                    score,
                    interpolated: false,
                };
            }
            let before = known.range(..year).next_back();
            let after = known.range(year..).next();
            let score = match (before, after) {
                (Some((&y0, &v0)), Some((&y1, &v1))) => {
                    let t = f64::from(year - y0) / f64::from(y1 - y0);
                    v0 + (v1 - v0) * t
                }
                (Some((_, &v)), None) | (None, Some((_, &v))) => v,
                // unreachable with a non-empty map
                (None, None) => 0.0,
            };
            TrendPoint {
                year,
                score,
                interpolated: true,
            }
        })
        .collect()
}
