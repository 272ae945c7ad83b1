//! Source → filter → loader pipeline.

mod cleaning;
mod loader;
pub(crate) mod record;
mod source;

pub use cleaning::{clean, passes_filter, Clean, CleaningStats};
pub use loader::{LoadReport, Loader, DEFAULT_BATCH_SIZE};
pub use record::{RawTrackRecord, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
pub use source::{CsvTrackSource, RawRecords};

use crate::catalog::SqliteTrackStore;
use crate::error::Result;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub cleaning: CleaningStats,
    pub load: LoadReport,
}

/// Streams every record of `source` through the cleaning filter into `store`.
///
/// A row the CSV reader cannot decode stops the pipeline with a `Csv` error
/// once the records read before it have been written.
pub fn run_pipeline<R: io::Read>(
    source: CsvTrackSource<R>,
    store: &mut SqliteTrackStore,
    loader: &Loader,
) -> Result<PipelineReport> {
    let mut read_error = None;
    let raw = source
        .records()
        .map_while(|record| record.map_err(|e| read_error = Some(e)).ok());
    let mut cleaned = clean(raw);

    let load = loader.load(store, &mut cleaned);
    let cleaning = cleaned.stats();
    drop(cleaned);

    if let Some(err) = read_error {
        return Err(err);
    }
    let load = load?;
    info!(
        "Pipeline finished: {} rows kept, {} dropped by the filter",
        cleaning.kept, cleaning.dropped
    );
    Ok(PipelineReport { cleaning, load })
}

/// Loads the CSV at `path` into `store`. With `reset`, the catalog is emptied
/// first, but only once the dataset has opened and its header checked out.
pub fn load_csv<P: AsRef<Path>>(
    path: P,
    store: &mut SqliteTrackStore,
    loader: &Loader,
    reset: bool,
) -> Result<PipelineReport> {
    let source = CsvTrackSource::open(path)?;
    if reset {
        store.reset_schema()?;
    }
    run_pipeline(source, store, loader)
}
