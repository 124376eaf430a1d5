//! Reading and writing timelog files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::parser::{self, ParseErrors, Parsed};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{errors} in {}", .path.display())]
    Syntax { path: PathBuf, errors: ParseErrors },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StorageError::NotFound(path)
            | StorageError::Io { path, .. }
            | StorageError::Syntax { path, .. } => path,
        }
    }
}

/// A parsed file together with where it came from.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub path: PathBuf,
    pub parsed: Parsed,
}

/// Parsing is independent of where the text comes from.
pub trait RecordParser {
    fn parse_file(&self, path: &Path) -> Result<Loaded, StorageError>;
}

/// Reads files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileParser;

impl RecordParser for FileParser {
    fn parse_file(&self, path: &Path) -> Result<Loaded, StorageError> {
        let text = read_file(path)?;
        let parsed = parser::parse(&text).map_err(|errors| StorageError::Syntax {
            path: path.to_path_buf(),
            errors,
        })?;
        log::debug!("parsed {} record(s) from {}", parsed.len(), path.display());
        Ok(Loaded {
            path: path.to_path_buf(),
            parsed,
        })
    }
}

pub fn read_file(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|e| StorageError::io(path, e))
}

pub fn write_file(path: &Path, text: &str) -> Result<(), StorageError> {
    log::debug!("writing {} byte(s) to {}", text.len(), path.display());
    fs::write(path, text).map_err(|e| StorageError::io(path, e))
}

/// Parses every file in parallel. Results keep the order of `paths`; all
/// failures are reported together.
pub fn parse_files<P>(parser: &P, paths: &[PathBuf]) -> Result<Vec<Loaded>, Vec<StorageError>>
where
    P: RecordParser + Sync,
{
    let results: Vec<Result<Loaded, StorageError>> =
        paths.par_iter().map(|p| parser.parse_file(p)).collect();
    let (loaded, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    if failed.is_empty() {
        Ok(loaded.into_iter().filter_map(Result::ok).collect())
    } else {
        Err(failed.into_iter().filter_map(Result::err).collect())
    }
}
