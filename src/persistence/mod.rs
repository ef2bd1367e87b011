//! JSON document load/save
//!
//! Scenarios, replays, settings and high scores are all plain serde JSON
//! files. Errors carry the path so callers can log them directly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::sim::def::ScenarioDef;
use crate::sim::replay::ReplayDoc;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and decode a JSON document
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode and write a JSON document, replacing any existing file
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_scenario(path: &Path) -> Result<ScenarioDef, PersistenceError> {
    load_json(path)
}

pub fn load_replay(path: &Path) -> Result<ReplayDoc, PersistenceError> {
    load_json(path)
}

pub fn save_replay(path: &Path, replay: &ReplayDoc) -> Result<(), PersistenceError> {
    save_json(path, replay)
}
