use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::option::LevelOption;

/// Default location of the index, relative to the game project root.
pub const LEVEL_INDEX_RELATIVE_PATH: &str = "assets/levels/index.yoli";

#[derive(Debug, Deserialize)]
struct LevelEntry {
    filename: String,
}

/// The index is a two element array: an opaque header, then the entries.
#[derive(Debug, Deserialize)]
struct LevelIndexFile(IgnoredAny, Vec<LevelEntry>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexShapeError {
    /// JSON location of the offending value, e.g. `[1][0].filename`.
    /// `None` when the problem is the document itself.
    pub location: Option<String>,
    pub message: String,
}

impl fmt::Display for IndexShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for IndexShapeError {}

#[derive(Debug, Error)]
pub enum LevelIndexError {
    #[error("level index not found at {path}")]
    NotFound { path: PathBuf },
    #[error("failed to read level index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed level index {path}: {source}")]
    MalformedIndex {
        path: PathBuf,
        #[source]
        source: IndexShapeError,
    },
}

/// Reads the index at `path` and returns its levels in file order.
///
/// Nothing is cached: every call reads the file again.
pub fn resolve_level_options(path: &Path) -> Result<Vec<LevelOption>, LevelIndexError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LevelIndexError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LevelIndexError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let options =
        parse_level_index(&raw).map_err(|source| LevelIndexError::MalformedIndex {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(
        path = %path.display(),
        option_count = options.len(),
        "level_options_resolved"
    );
    Ok(options)
}

pub fn parse_level_index(raw: &str) -> Result<Vec<LevelOption>, IndexShapeError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let LevelIndexFile(_header, entries) =
        serde_path_to_error::deserialize::<_, LevelIndexFile>(&mut deserializer).map_err(
            |error| {
                let location = error.path().to_string();
                let source = error.into_inner();
                IndexShapeError {
                    location: if location.is_empty() || location == "." {
                        None
                    } else {
                        Some(location)
                    },
                    message: source.to_string(),
                }
            },
        )?;
    deserializer.end().map_err(|error| IndexShapeError {
        location: None,
        message: error.to_string(),
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            LevelOption::from_filename(&entry.filename).ok_or_else(|| IndexShapeError {
                location: Some(format!("[1][{index}].filename")),
                message: format!("level filename '{}' has an empty name", entry.filename),
            })
        })
        .collect()
}
