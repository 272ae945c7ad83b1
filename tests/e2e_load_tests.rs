//! End-to-end tests for loading a CSV dataset into the catalog.

mod common;

use common::*;
use std::fs;
use std::process::Command;
use trackstats::analytics::{genre_stats, YearBounds};
use trackstats::catalog::TableCounts;
use trackstats::ingest::{load_csv, CsvTrackSource, Loader};
use trackstats::TrackStatsError;

const SAMPLE_COUNTS: TableCounts = TableCounts {
    artists: 4,
    genres: 3,
    tracks: 7,
    links: 11,
};

#[test]
fn test_load_sample_dataset() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    let report = catalog.load(500).unwrap();

    assert_eq!(report.cleaning.kept, KEPT_ROWS.len() + 1);
    assert_eq!(report.cleaning.dropped, DROPPED_ROWS.len());
    assert_eq!(report.load.tracks_inserted, KEPT_ROWS.len());
    assert_eq!(report.load.skipped_malformed, 1);
    assert_eq!(report.load.malformed_by_field.get("year"), Some(&1));

    let store = catalog.open_store().unwrap();
    assert_eq!(store.counts().unwrap(), SAMPLE_COUNTS);
}

#[test]
fn test_load_twice_is_idempotent() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    catalog.load(3).unwrap();
    let store = catalog.open_store().unwrap();
    let first_tracks = store.list_tracks().unwrap();
    let first_links = store.list_links().unwrap();
    store.close().unwrap();

    let second = catalog.load(3).unwrap();
    assert_eq!(second.load.tracks_inserted, 0);
    assert_eq!(second.load.tracks_reused, KEPT_ROWS.len());
    assert_eq!(second.load.artists_created, 0);
    assert_eq!(second.load.genres_created, 0);
    assert_eq!(second.load.links_created, 0);

    let store = catalog.open_store().unwrap();
    assert_eq!(store.counts().unwrap(), SAMPLE_COUNTS);
    assert_eq!(store.list_tracks().unwrap(), first_tracks);
    assert_eq!(store.list_links().unwrap(), first_links);
}

#[test]
fn test_batch_size_does_not_change_result() {
    let single = TestCatalog::with_csv(&sample_csv()).unwrap();
    single.load(1).unwrap();
    let bulk = TestCatalog::with_csv(&sample_csv()).unwrap();
    bulk.load(500).unwrap();

    let single_store = single.open_store().unwrap();
    let bulk_store = bulk.open_store().unwrap();
    assert_eq!(single_store.counts().unwrap(), bulk_store.counts().unwrap());
    assert_eq!(single_store.list_links().unwrap(), bulk_store.list_links().unwrap());
}

#[test]
fn test_persisted_tracks_satisfy_filter() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    let store = catalog.loaded_store().unwrap();
    let tracks = store.list_tracks().unwrap();
    assert!(!tracks.is_empty());
    for track in tracks {
        assert!(track.popularity > 50, "{:?}", track);
        assert!((0.33..=0.66).contains(&track.speechiness), "{:?}", track);
        assert!(track.danceability > 0.2, "{:?}", track);
    }
}

#[test]
fn test_no_orphan_links_after_load() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    let store = catalog.loaded_store().unwrap();
    assert_eq!(store.orphan_link_count().unwrap(), 0);

    let tracks = store.list_tracks().unwrap();
    for link in store.list_links().unwrap() {
        let track = tracks.iter().find(|t| t.id == link.track_id).unwrap();
        assert_eq!(track.artist_id, link.artist_id);
    }
}

#[test]
fn test_artist_names_deduplicated_case_insensitively() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    let store = catalog.loaded_store().unwrap();

    let drakes: Vec<_> = store
        .list_artists()
        .unwrap()
        .into_iter()
        .filter(|a| a.name_key == "drake")
        .collect();
    assert_eq!(drakes.len(), 1);
    assert_eq!(drakes[0].name, "Drake");

    let drake = store.find_artist("DRAKE").unwrap().unwrap();
    let drake_tracks = store
        .list_tracks()
        .unwrap()
        .into_iter()
        .filter(|t| t.artist_id == drake.id)
        .count();
    assert_eq!(drake_tracks, 2);
}

#[test]
fn test_duration_is_rounded_to_seconds() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    let store = catalog.loaded_store().unwrap();
    let one_dance = store
        .list_tracks()
        .unwrap()
        .into_iter()
        .find(|t| t.name == "One Dance")
        .unwrap();
    assert_eq!(one_dance.duration_secs, 174);
    assert!(!one_dance.explicit);
}

#[test]
fn test_missing_columns_fail_before_load() {
    let catalog = TestCatalog::with_csv("artist,song,year\nDrake,One Dance,2016\n").unwrap();
    match CsvTrackSource::open(&catalog.csv_path) {
        Err(TrackStatsError::MissingColumns(missing)) => {
            assert!(missing.contains(&"popularity".to_string()));
            assert!(missing.contains(&"genre".to_string()));
        }
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("header should have been rejected"),
    }
    let store = catalog.open_store().unwrap();
    assert_eq!(store.counts().unwrap(), TableCounts::default());
}

#[test]
fn test_reopen_validates_and_reset_empties() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    catalog.load(500).unwrap();

    let mut store = catalog.open_store().unwrap();
    store.ensure_schema().unwrap();
    assert_eq!(store.counts().unwrap(), SAMPLE_COUNTS);

    store.reset_schema().unwrap();
    assert_eq!(store.counts().unwrap(), TableCounts::default());
    store.close().unwrap();

    catalog.load(500).unwrap();
    assert_eq!(catalog.open_store().unwrap().counts().unwrap(), SAMPLE_COUNTS);
}

#[test]
fn test_unpopular_track_is_dropped_before_stats() {
    let rows = [
        track_row("Alpha", "A", 2010, 80, 0.4, 0.6, "pop"),
        track_row("Beta", "B", 2010, 40, 0.4, 0.6, "pop"),
    ];
    let catalog = TestCatalog::with_csv(&csv_with_rows(&rows)).unwrap();
    let store = catalog.loaded_store().unwrap();
    assert_eq!(store.counts().unwrap().tracks, 1);
    assert!(store.find_artist("Beta").unwrap().is_none());

    let report = genre_stats(&store, &YearBounds::default(), 2010).unwrap();
    let pop = report.get("pop").unwrap();
    assert_eq!(pop.track_count, 1);
    assert_eq!(pop.avg_popularity, 80.0);
    assert_eq!(pop.share, 1.0);
}

#[test]
fn test_reset_with_bad_header_keeps_catalog() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    catalog.load(500).unwrap();
    let bad_csv = catalog.dir.path().join("bad.csv");
    fs::write(&bad_csv, "artist,song,year\nDrake,One Dance,2016\n").unwrap();

    let mut store = catalog.open_store().unwrap();
    let result = load_csv(&bad_csv, &mut store, &Loader::default(), true);
    assert!(matches!(result, Err(TrackStatsError::MissingColumns(_))));
    assert_eq!(store.counts().unwrap(), SAMPLE_COUNTS);
}

#[test]
fn test_cli_reset_with_bad_header_keeps_catalog() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    catalog.load(500).unwrap();
    let bad_csv = catalog.dir.path().join("bad.csv");
    fs::write(&bad_csv, "artist,song,year\nDrake,One Dance,2016\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_trackstats"))
        .arg("--db")
        .arg(&catalog.db_path)
        .arg("load")
        .arg(&bad_csv)
        .arg("--reset")
        .status()
        .unwrap();
    assert!(!status.success());
    assert_eq!(catalog.open_store().unwrap().counts().unwrap(), SAMPLE_COUNTS);
}

#[test]
fn test_reset_then_reload() {
    let catalog = TestCatalog::with_csv(&sample_csv()).unwrap();
    catalog.load(500).unwrap();

    let mut store = catalog.open_store().unwrap();
    let report = load_csv(&catalog.csv_path, &mut store, &Loader::default(), true).unwrap();
    assert_eq!(report.load.tracks_inserted, KEPT_ROWS.len());
    assert_eq!(store.counts().unwrap(), SAMPLE_COUNTS);
}
