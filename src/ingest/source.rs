//! CSV adapter yielding raw track records.

use super::record::{RawTrackRecord, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
use crate::error::{Result, TrackStatsError};
use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// A track dataset whose header has been checked against the required columns.
pub struct CsvTrackSource<R: io::Read> {
    reader: csv::Reader<R>,
    /// Known column name for each position of the header, if any.
    columns: Vec<Option<&'static str>>,
}

impl CsvTrackSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Reading tracks from {}", path.display());
        Self::from_reader(file)
    }
}

impl<R: io::Read> CsvTrackSource<R> {
    /// Reads the header row. Fails with `MissingColumns` listing every absent
    /// required column.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();

        let columns: Vec<Option<&'static str>> = headers
            .iter()
            .map(|header| {
                REQUIRED_COLUMNS
                    .iter()
                    .chain(OPTIONAL_COLUMNS.iter())
                    .find(|known| known.eq_ignore_ascii_case(header))
                    .copied()
            })
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !columns.contains(&Some(**required)))
            .map(|required| required.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TrackStatsError::MissingColumns(missing));
        }

        let ignored = columns.iter().filter(|c| c.is_none()).count();
        debug!(
            "Source header has {} columns, {} ignored",
            columns.len(),
            ignored
        );
        Ok(CsvTrackSource { reader, columns })
    }

    pub fn records(self) -> RawRecords<R> {
        RawRecords {
            rows: self.reader.into_records(),
            columns: self.columns,
        }
    }
}

/// Iterator over the rows of a [`CsvTrackSource`]. A row the reader cannot
/// decode yields a `Csv` error.
pub struct RawRecords<R: io::Read> {
    rows: StringRecordsIntoIter<R>,
    columns: Vec<Option<&'static str>>,
}

impl<R: io::Read> Iterator for RawRecords<R> {
    type Item = Result<RawTrackRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let mut record = RawTrackRecord::new(line);
        for (column, value) in self.columns.iter().zip(row.iter()) {
            if let Some(column) = column {
                record.set_field(column, value);
            }
        }
        Some(Ok(record))
    }
}
