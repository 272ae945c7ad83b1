//! Batched, idempotent writer from cleaned records into the catalog.

use super::record::RawTrackRecord;
use crate::catalog::{
    insert_link_if_absent, insert_track_if_absent, normalize_name_key, row_exists, upsert_named,
    NewTrack, SqliteTrackStore, TrackGenreArtistLink,
};
use crate::error::{Result, TrackStatsError};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub records_seen: usize,
    pub tracks_inserted: usize,
    /// Records whose `(name, artist, year)` was already stored.
    pub tracks_reused: usize,
    pub artists_created: usize,
    pub genres_created: usize,
    pub links_created: usize,
    pub skipped_malformed: usize,
    /// Skipped records per offending field.
    pub malformed_by_field: BTreeMap<String, usize>,
    pub batches_committed: usize,
}

impl LoadReport {
    fn absorb(&mut self, batch: LoadReport) {
        self.records_seen += batch.records_seen;
        self.tracks_inserted += batch.tracks_inserted;
        self.tracks_reused += batch.tracks_reused;
        self.artists_created += batch.artists_created;
        self.genres_created += batch.genres_created;
        self.links_created += batch.links_created;
        self.skipped_malformed += batch.skipped_malformed;
        for (field, count) in batch.malformed_by_field {
            *self.malformed_by_field.entry(field).or_default() += count;
        }
        self.batches_committed += batch.batches_committed;
    }
}

/// `name_key -> id` lookups for one relation. Entries created by the batch in
/// flight stay pending until it commits.
#[derive(Default)]
struct KeyIndex {
    committed: HashMap<String, i64>,
    pending: HashMap<String, i64>,
}

impl KeyIndex {
    fn seeded(committed: HashMap<String, i64>) -> Self {
        KeyIndex {
            committed,
            pending: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<i64> {
        self.pending
            .get(key)
            .or_else(|| self.committed.get(key))
            .copied()
    }

    fn stage(&mut self, key: String, id: i64) {
        self.pending.insert(key, id);
    }

    fn commit(&mut self) {
        self.committed.extend(self.pending.drain());
    }

    fn discard(&mut self) {
        self.pending.clear();
    }
}

struct Indices {
    artists: KeyIndex,
    genres: KeyIndex,
}

impl Indices {
    fn commit(&mut self) {
        self.artists.commit();
        self.genres.commit();
    }

    fn discard(&mut self) {
        self.artists.discard();
        self.genres.discard();
    }
}

pub struct Loader {
    batch_size: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Loader {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Loader {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrackStatsError::InvalidParameter {
                name: "batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Loader { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Writes every record into `store`, one transaction per batch.
    ///
    /// Malformed records are skipped and counted. Any other error rolls back
    /// the batch in flight and aborts; batches committed before it stay, and
    /// loading the same input again converges to the state of a clean run.
    pub fn load<I>(&self, store: &mut SqliteTrackStore, records: I) -> Result<LoadReport>
    where
        I: IntoIterator<Item = RawTrackRecord>,
    {
        let mut indices = Indices {
            artists: KeyIndex::seeded(store.artist_index()?),
            genres: KeyIndex::seeded(store.genre_index()?),
        };
        let mut report = LoadReport::default();
        let mut records = records.into_iter().peekable();

        while records.peek().is_some() {
            let batch: Vec<RawTrackRecord> = records.by_ref().take(self.batch_size).collect();
            match write_batch(store, &mut indices, &batch) {
                Ok(batch_report) => {
                    indices.commit();
                    debug!(
                        "Committed batch {} ({} records, {} new tracks)",
                        report.batches_committed + 1,
                        batch_report.records_seen,
                        batch_report.tracks_inserted
                    );
                    report.absorb(batch_report);
                }
                Err(e) => {
                    indices.discard();
                    warn!(
                        "Batch {} rolled back: {}",
                        report.batches_committed + 1,
                        e
                    );
                    return Err(e);
                }
            }
        }

        info!(
            "Loaded {} records: {} new tracks, {} reused, {} new artists, {} new genres, {} skipped",
            report.records_seen,
            report.tracks_inserted,
            report.tracks_reused,
            report.artists_created,
            report.genres_created,
            report.skipped_malformed
        );
        Ok(report)
    }
}

/// Runs one batch inside a transaction. The transaction rolls back when
/// dropped without commit, so every early return leaves storage untouched.
fn write_batch(
    store: &mut SqliteTrackStore,
    indices: &mut Indices,
    batch: &[RawTrackRecord],
) -> Result<LoadReport> {
    let tx = store.transaction()?;
    let mut report = LoadReport::default();

    for record in batch {
        report.records_seen += 1;
        let track = match record.to_new_track() {
            Ok(track) => track,
            Err(TrackStatsError::MalformedRecord {
                line,
                field,
                reason,
            }) => {
                warn!("Skipping line {}: field '{}' {}", line, field, reason);
                report.skipped_malformed += 1;
                *report
                    .malformed_by_field
                    .entry(field.to_string())
                    .or_default() += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        write_track(&tx, indices, &track, &mut report)?;
    }

    tx.commit()?;
    report.batches_committed = 1;
    Ok(report)
}

fn write_track(
    conn: &Connection,
    indices: &mut Indices,
    track: &NewTrack,
    report: &mut LoadReport,
) -> Result<()> {
    let artist_id = resolve(
        conn,
        &mut indices.artists,
        "artists",
        &track.artist_name,
        &mut report.artists_created,
    )?;
    let mut genre_ids = Vec::with_capacity(track.genres.len());
    for genre in &track.genres {
        genre_ids.push(resolve(
            conn,
            &mut indices.genres,
            "genres",
            genre,
            &mut report.genres_created,
        )?);
    }

    ensure_row(conn, "artists", artist_id)?;
    let (track_id, inserted) = insert_track_if_absent(conn, track, artist_id)?;
    if inserted {
        report.tracks_inserted += 1;
    } else {
        report.tracks_reused += 1;
    }

    for genre_id in genre_ids {
        let link = TrackGenreArtistLink {
            track_id,
            artist_id,
            genre_id,
        };
        ensure_row(conn, "tracks", link.track_id)?;
        ensure_row(conn, "artists", link.artist_id)?;
        ensure_row(conn, "genres", link.genre_id)?;
        if insert_link_if_absent(conn, &link)? {
            report.links_created += 1;
        }
    }
    Ok(())
}

/// Looks the name up in the index, upserting it on a miss.
fn resolve(
    conn: &Connection,
    index: &mut KeyIndex,
    table: &str,
    name: &str,
    created: &mut usize,
) -> Result<i64> {
    let key = normalize_name_key(name);
    if let Some(id) = index.get(&key) {
        return Ok(id);
    }
    let (id, inserted) = upsert_named(conn, table, name.trim(), &key)?;
    if inserted {
        *created += 1;
    }
    index.stage(key, id);
    Ok(id)
}

fn ensure_row(conn: &Connection, table: &'static str, id: i64) -> Result<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(TrackStatsError::ReferentialIntegrity { table, id })
    }
}
