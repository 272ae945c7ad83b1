mod file_config;

pub use file_config::{FileConfig, RankingConfig, YearsConfig};

use crate::analytics::{RankingWeights, YearBounds};
use crate::catalog::SqliteTrackStore;
use crate::ingest::DEFAULT_BATCH_SIZE;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "trackstats.db";
pub const DEFAULT_K: usize = 5;

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub batch_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Where the analyses take their accepted year range from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearsSetting {
    Fixed(YearBounds),
    /// The span of years present in the database.
    Observed,
}

impl YearsSetting {
    pub fn bounds(&self, store: &SqliteTrackStore) -> crate::Result<YearBounds> {
        match self {
            YearsSetting::Fixed(bounds) => Ok(*bounds),
            YearsSetting::Observed => YearBounds::observed(store),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub batch_size: usize,
    pub years: YearsSetting,
    pub ranking_weights: RankingWeights,
    pub default_k: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let batch_size = file.batch_size.unwrap_or(cli.batch_size);
        if batch_size == 0 {
            bail!("batch_size must be greater than zero");
        }

        let years_file = file.years.unwrap_or_default();
        let years = if years_file.observed.unwrap_or(false) {
            if years_file.min.is_some() || years_file.max.is_some() {
                bail!("years.observed cannot be combined with years.min or years.max");
            }
            YearsSetting::Observed
        } else {
            let defaults = YearBounds::default();
            let bounds = YearBounds::new(
                years_file.min.unwrap_or(defaults.min),
                years_file.max.unwrap_or(defaults.max),
            )
            .context("Invalid [years] section")?;
            YearsSetting::Fixed(bounds)
        };

        let ranking_file = file.ranking.unwrap_or_default();
        let weight_defaults = RankingWeights::default();
        let ranking_weights = RankingWeights::new(
            ranking_file
                .song_weight
                .unwrap_or(weight_defaults.song_weight),
            ranking_file
                .popularity_weight
                .unwrap_or(weight_defaults.popularity_weight),
        )
        .context("Invalid [ranking] weights")?;

        let default_k = ranking_file.default_k.unwrap_or(DEFAULT_K);
        if default_k == 0 {
            bail!("ranking.default_k must be greater than zero");
        }

        Ok(AppConfig {
            db_path,
            batch_size,
            years,
            ranking_weights,
            default_k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.years, YearsSetting::Fixed(YearBounds::new(1998, 2020).unwrap()));
        assert_eq!(config.ranking_weights, RankingWeights::default());
        assert_eq!(config.default_k, 5);
    }

    #[test]
    fn test_resolve_cli_only() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/tmp/cli.db")),
            batch_size: 64,
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/cli.db"));
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_resolve_file_overrides_cli() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/tmp/cli.db")),
            batch_size: 64,
        };
        let file = FileConfig {
            db_path: Some("/tmp/file.db".to_string()),
            batch_size: Some(1000),
            years: Some(YearsConfig {
                min: Some(2005),
                max: None,
                observed: None,
            }),
            ranking: Some(RankingConfig {
                song_weight: Some(0.3),
                popularity_weight: Some(0.7),
                default_k: Some(3),
            }),
        };
        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/file.db"));
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.years, YearsSetting::Fixed(YearBounds::new(2005, 2020).unwrap()));
        assert_eq!(config.ranking_weights.song_weight, 0.3);
        assert_eq!(config.default_k, 3);
    }

    #[test]
    fn test_resolve_observed_years() {
        let file = FileConfig {
            years: Some(YearsConfig {
                observed: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap();
        assert_eq!(config.years, YearsSetting::Observed);
    }

    #[test]
    fn test_resolve_rejects_invalid_values() {
        let zero_batch = FileConfig {
            batch_size: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(zero_batch)).is_err());

        let inverted_years = FileConfig {
            years: Some(YearsConfig {
                min: Some(2020),
                max: Some(2000),
                observed: None,
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(inverted_years)).is_err());

        let bad_weights = FileConfig {
            ranking: Some(RankingConfig {
                song_weight: Some(0.9),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(bad_weights)).is_err());

        let zero_k = FileConfig {
            ranking: Some(RankingConfig {
                default_k: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(zero_k)).is_err());
    }
}
