//! Temporary datasets and catalogs.

use super::constants::*;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use trackstats::ingest::{run_pipeline, CsvTrackSource, Loader, PipelineReport};
use trackstats::SqliteTrackStore;

/// A CSV row with the given identity and predicate fields. Audio features
/// not under test get fixed values.
pub fn track_row(
    artist: &str,
    song: &str,
    year: u16,
    popularity: i64,
    speechiness: f64,
    danceability: f64,
    genre: &str,
) -> String {
    format!(
        "{},{},200000,False,{},{},{},0.6,1,-6.0,1,{},0.1,0,0.1,0.5,110.0,\"{}\"",
        artist, song, year, popularity, danceability, speechiness, genre
    )
}

/// The sample dataset: every kept, dropped and malformed row.
pub fn sample_csv() -> String {
    let mut rows: Vec<String> = KEPT_ROWS.iter().map(|r| r.to_string()).collect();
    rows.extend(DROPPED_ROWS.iter().map(|r| r.to_string()));
    rows.push(MALFORMED_ROW.to_string());
    csv_with_rows(&rows)
}

pub fn csv_with_rows<S: AsRef<str>>(rows: &[S]) -> String {
    let mut body = String::from(CSV_HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row.as_ref());
        body.push('\n');
    }
    body
}

/// A catalog database and dataset in a temporary directory.
pub struct TestCatalog {
    pub dir: TempDir,
    pub db_path: PathBuf,
    pub csv_path: PathBuf,
}

impl TestCatalog {
    pub fn with_csv(body: &str) -> Result<Self> {
        let dir = TempDir::new()?;
        let db_path = dir.path().join("catalog.db");
        let csv_path = dir.path().join("songs.csv");
        fs::write(&csv_path, body)?;
        Ok(TestCatalog {
            dir,
            db_path,
            csv_path,
        })
    }

    pub fn open_store(&self) -> Result<SqliteTrackStore> {
        Ok(SqliteTrackStore::open(&self.db_path)?)
    }

    /// Runs the whole pipeline over the dataset with the given batch size.
    pub fn load(&self, batch_size: usize) -> Result<PipelineReport> {
        let mut store = self.open_store()?;
        let source = CsvTrackSource::open(&self.csv_path)?;
        let report = run_pipeline(source, &mut store, &Loader::new(batch_size)?)?;
        store.close()?;
        Ok(report)
    }

    /// Loads the dataset and returns the open store.
    pub fn loaded_store(&self) -> Result<SqliteTrackStore> {
        self.load(500)?;
        self.open_store()
    }
}
