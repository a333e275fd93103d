//! Boat Plate Reader - ship hull license plate detection and recognition
//!
//! Finds the most confident text region in a photo of a vessel, crops it and
//! reads the plate number. Results can be kept in a local SQLite database.

mod app;
mod config;
mod dashboard;
mod pipeline;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::pipeline::Recognizer;
use crate::storage::RecordStore;
use crate::vision::PaddleOcrEngine;

/// Boat Plate Reader - ship plate detection and recognition
#[derive(Parser, Debug)]
#[command(name = "boat-plate-reader")]
#[command(about = "Detect and read the license plate painted on a ship hull")]
struct Args {
    /// Recognize this image and print the result instead of opening the window
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Save the headless result to the database
    #[arg(long, requires = "image")]
    save: bool,

    /// Print the newest N saved recognitions and exit
    #[arg(long, value_name = "N")]
    history: Option<usize>,

    /// Configuration file (defaults to <config dir>/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not open the recognition database
    #[arg(long)]
    no_store: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_or_create_config(args.config.as_deref());

    let store = if args.no_store || !config.storage.enabled {
        info!("Record store disabled");
        None
    } else {
        open_store(&config)
    };

    if let Some(limit) = args.history {
        let store = store.context("Record store is not available")?;
        print_history(&store, limit)?;
        store.close()?;
        return Ok(());
    }

    info!("Boat Plate Reader starting...");

    // The engine is required in every remaining mode
    let engine = PaddleOcrEngine::from_settings(&config.ocr).context("Failed to initialize OCR engine")?;

    if let Some(image) = args.image {
        run_headless(engine, &image, args.save, store)?;
    } else if let Err(e) = dashboard::run_dashboard(engine, store, config.window.clone()) {
        tracing::error!("Dashboard error: {}", e);
    }

    info!("Boat Plate Reader shutdown complete");

    Ok(())
}

/// Load configuration from file or create default
fn load_or_create_config(explicit: Option<&Path>) -> AppConfig {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => storage::get_config_dir().ok().map(|dir| dir.join("config.toml")),
    };

    if let Some(config_path) = config_path {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => warn!("Ignoring invalid configuration {:?}: {}", config_path, e),
            }
        } else if explicit.is_none() {
            let config = AppConfig::default();
            match config::save_config(&config, &config_path) {
                Ok(()) => info!("Wrote default configuration to {:?}", config_path),
                Err(e) => warn!("Could not write default configuration: {}", e),
            }
            return config;
        }
    }

    info!("Using default configuration");
    AppConfig::default()
}

/// Open the record store; failures only disable saving
fn open_store(config: &AppConfig) -> Option<RecordStore> {
    let path = match &config.storage.database_path {
        Some(path) => path.clone(),
        None => match storage::default_database_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not resolve database location, records will not outlive this session: {}", e);
                return RecordStore::open_in_memory()
                    .map_err(|e| warn!("Could not open in-memory database: {}", e))
                    .ok();
            }
        },
    };

    match RecordStore::open(&path) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Could not open database {:?}: {}", path, e);
            None
        }
    }
}

fn run_headless(engine: PaddleOcrEngine, image: &Path, save: bool, store: Option<RecordStore>) -> Result<()> {
    let mut recognizer = Recognizer::new(engine);
    let result = recognizer.recognize(image)?;

    match (&result.text, &result.region) {
        (Some(text), Some(region)) => println!(
            "{}\t({}, {}) - ({}, {})\t{:.3}",
            text,
            region.x1,
            region.y1,
            region.x2,
            region.y2,
            result.confidence.unwrap_or_default()
        ),
        (Some(text), None) => println!("{}\t(no visible region)", text),
        (None, _) => println!("No plate detected"),
    }

    if save {
        let store = store.context("Record store is not available")?;
        match result.savable_record() {
            Some((image_name, text)) => {
                let id = store.append(image_name, text)?;
                println!("Saved as record {}", id);
            }
            None => println!("Nothing to save"),
        }
        store.close()?;
    }

    Ok(())
}

fn print_history(store: &RecordStore, limit: usize) -> Result<()> {
    let records = store.recent(limit)?;
    println!("{} of {} records", records.len(), store.count()?);
    for record in records {
        println!(
            "{:>5}  {}  {}  {}",
            record.id, record.timestamp, record.image_filename, record.recognized_text
        );
    }
    Ok(())
}
