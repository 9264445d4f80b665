use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::data_store::{DataStore, DataValue};

/// Failure while scanning a data directory. Any error aborts the whole load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("cannot list {path:?}: {source}")]
    Walk {
        path: PathBuf,
        source: ignore::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path of the entry that caused the failure.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Walk { path, .. }
            | LoadError::Json { path, .. } => path,
        }
    }
}

/// How a directory entry is handled, decided from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Skip,
    Json,
    Text,
}

/// Checks run on the raw name bytes, so a non-UTF-8 name is never altered
/// before matching.
pub fn classify(name: &OsStr) -> EntryKind {
    let bytes = name.as_encoded_bytes();
    let is_readme = bytes.len() >= 6 && bytes[..6].eq_ignore_ascii_case(b"readme");

    match bytes {
        b"." | b".." => EntryKind::Skip,
        _ if is_readme => EntryKind::Skip,
        _ if bytes.ends_with(b".json") => EntryKind::Json,
        _ => EntryKind::Text,
    }
}

/// Load every entry of `dir` into a [`DataStore`] keyed by absolute path.
///
/// A missing directory yields an empty store. Entries are visited in file
/// name order and are not recursed into: a subdirectory is read like a file
/// and fails. On the first error nothing is returned.
pub fn load(dir: &Path) -> Result<DataStore, LoadError> {
    let mut store = DataStore::new();

    let root = match fs::canonicalize(dir) {
        Ok(root) => root,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("data directory {} does not exist", dir.display());
            return Ok(store);
        }
        Err(err) => return Err(LoadError::io(dir, err)),
    };

    if !root.is_dir() {
        return Err(LoadError::io(
            root,
            io::Error::new(io::ErrorKind::NotADirectory, "data path is not a directory"),
        ));
    }

    let walker = WalkBuilder::new(&root)
        .max_depth(Some(1))
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for result in walker {
        let entry = result.map_err(|source| LoadError::Walk {
            path: root.clone(),
            source,
        })?;

        if entry.depth() == 0 {
            continue;
        }

        let name = entry.file_name();
        tracing::debug!("scanning {}", name.to_string_lossy());

        let kind = classify(name);
        if kind == EntryKind::Skip {
            continue;
        }

        let path = root.join(name);
        let bytes = fs::read(&path).map_err(|err| LoadError::io(&path, err))?;

        let value = match kind {
            EntryKind::Json => {
                let parsed = serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
                    path: path.clone(),
                    source,
                })?;
                DataValue::Json(parsed)
            }
            _ => DataValue::Text(decode_text(&path, bytes)),
        };

        store.insert(path, value);
    }

    tracing::info!("loaded {} data entries from {}", store.len(), root.display());
    Ok(store)
}

/// Text files are not required to be UTF-8; invalid sequences become U+FFFD.
fn decode_text(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("{} is not valid UTF-8, storing it lossily", path.display());
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}
