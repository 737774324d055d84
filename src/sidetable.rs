//! JSON side tables kept next to the build output.
//!
//! Subscribers, click counts and the notification watermark are small
//! single-writer tables. Each lives in one pretty-printed JSON file under the
//! temp directory:
//!
//! ```text
//! .newsstand-temp/
//! ├── issues.json          # catalog (stage 1 output)
//! ├── subscribers.json
//! ├── clicks.json
//! └── notify-state.json
//! ```
//!
//! A missing file reads as an empty table. A corrupt file is an error rather
//! than an empty table: silently starting over would drop every subscriber
//! on the next write.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUBSCRIBERS_FILENAME: &str = "subscribers.json";
pub const CLICKS_FILENAME: &str = "clicks.json";
pub const NOTIFY_STATE_FILENAME: &str = "notify-state.json";

#[derive(Error, Debug)]
pub enum SideTableError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Corrupt table {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a table, or its default when the file does not exist yet.
pub fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, SideTableError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(SideTableError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content).map_err(|source| SideTableError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a table, creating its directory if needed.
pub fn save<T: Serialize>(path: &Path, table: &T) -> Result<(), SideTableError> {
    let io_err = |source| SideTableError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(table).map_err(|source| SideTableError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}
