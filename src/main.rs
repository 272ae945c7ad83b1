use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trackstats::analytics::{
    artist_genre_comparison, artist_trends, genre_stats, parse_k, parse_year, top_artists,
};
use trackstats::config::{AppConfig, CliConfig, FileConfig};
use trackstats::ingest::{load_csv, Loader, DEFAULT_BATCH_SIZE};
use trackstats::SqliteTrackStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "trackstats")]
#[command(about = "Load a track dataset into SQLite and query genre and artist statistics")]
struct CliArgs {
    /// Path to a TOML configuration file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Number of records written per transaction.
    #[clap(long, global = true, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a CSV dataset and load it into the catalog.
    Load {
        #[clap(value_parser = parse_path)]
        csv: PathBuf,

        /// Drop and recreate every table before loading.
        #[clap(long)]
        reset: bool,
    },
    /// Per-genre statistics for one year.
    GenreStats { year: String },
    /// Best artists over a range of years.
    TopArtists {
        start: String,
        end: String,

        /// Number of artists to return.
        #[clap(short)]
        k: Option<String>,

        /// Report the yearly score series of the ranked artists instead.
        #[clap(long)]
        trends: bool,
    },
    /// Compare an artist's popularity with each genre's.
    ArtistGenres { artist: String },
    /// Row counts of the catalog tables.
    Summary,
}

#[derive(Serialize)]
struct Summary {
    counts: trackstats::catalog::TableCounts,
    orphan_links: usize,
    year_bounds: Option<(u16, u16)>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        batch_size: cli_args.batch_size,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let mut store = SqliteTrackStore::open(&config.db_path)
        .with_context(|| format!("Failed to open catalog at {:?}", config.db_path))?;

    match cli_args.command {
        Command::Load { csv, reset } => {
            let loader = Loader::new(config.batch_size)?;
            let report = load_csv(&csv, &mut store, &loader, reset)
                .with_context(|| format!("Failed to load dataset {:?}", csv))?;
            print_json(&report)?;
        }
        Command::GenreStats { year } => {
            let bounds = config.years.bounds(&store)?;
            let year = parse_year(&year, &bounds)?;
            print_json(&genre_stats(&store, &bounds, year)?)?;
        }
        Command::TopArtists {
            start,
            end,
            k,
            trends,
        } => {
            let bounds = config.years.bounds(&store)?;
            let start = parse_year(&start, &bounds)?;
            let end = parse_year(&end, &bounds)?;
            let k = match k {
                Some(k) => parse_k(&k)?,
                None => config.default_k,
            };
            let weights = &config.ranking_weights;
            if trends {
                print_json(&artist_trends(&store, &bounds, weights, start, end, k)?)?;
            } else {
                print_json(&top_artists(&store, &bounds, weights, start, end, k)?)?;
            }
        }
        Command::ArtistGenres { artist } => {
            print_json(&artist_genre_comparison(&store, &artist)?)?;
        }
        Command::Summary => {
            let summary = Summary {
                counts: store.counts()?,
                orphan_links: store.orphan_link_count()?,
                year_bounds: store.observed_year_bounds()?,
            };
            print_json(&summary)?;
        }
    }

    store.close()?;
    Ok(())
}
