//! Storage Layer
//!
//! Handles persistence of recognition records using SQLite and resolves the
//! per-user application directories.

pub mod database;

pub use database::{RecognitionRecord, RecordStore, StoreError};

use anyhow::Result;
use std::path::PathBuf;

/// File name of the recognition database inside the data directory
pub const DATABASE_FILENAME: &str = "ship_recognition_data.db";

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "boatplate", "BoatPlateReader")
        .ok_or_else(|| anyhow::anyhow!("Could not determine application directories"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location of the recognition database
pub fn default_database_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DATABASE_FILENAME))
}
