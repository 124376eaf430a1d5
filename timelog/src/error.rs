//! Application-level failures and the exit codes they map to.

use crate::config::ConfigError;
use crate::reconcile::ReconcileError;
use crate::storage::StorageError;

pub const EXIT_GENERAL: u8 = 1;
pub const EXIT_NO_INPUT: u8 = 2;
pub const EXIT_NO_TARGET_FILE: u8 = 3;
pub const EXIT_IO: u8 = 4;
pub const EXIT_CONFIG: u8 = 5;
pub const EXIT_UNKNOWN_BOOKMARK: u8 = 6;
pub const EXIT_UNKNOWN_FILE: u8 = 7;
pub const EXIT_LOGICAL: u8 = 8;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no input files given")]
    NoInput,
    #[error("no target file given")]
    NoTargetFile,
    /// All files that failed to load; the first one decides the exit code.
    #[error("{}", describe(.0))]
    Files(Vec<StorageError>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown bookmark `{0}`")]
    UnknownBookmark(String),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("{0}")]
    Logical(String),
}

fn describe(errors: &[StorageError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn storage_code(e: &StorageError) -> u8 {
    match e {
        StorageError::NotFound(_) => EXIT_UNKNOWN_FILE,
        StorageError::Io { .. } => EXIT_IO,
        StorageError::Syntax { .. } => EXIT_LOGICAL,
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Files(vec![e])
    }
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NoInput => EXIT_NO_INPUT,
            AppError::NoTargetFile => EXIT_NO_TARGET_FILE,
            AppError::Files(errors) => errors.first().map_or(EXIT_GENERAL, storage_code),
            AppError::Config(_) => EXIT_CONFIG,
            AppError::UnknownBookmark(_) => EXIT_UNKNOWN_BOOKMARK,
            AppError::Reconcile(_) | AppError::Logical(_) => EXIT_LOGICAL,
        }
    }
}

/// The exit code for any error chain: the first [`AppError`] (or library error)
/// found in it decides, anything else is a general failure.
pub fn exit_code_of(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<AppError>() {
                Some(e.exit_code())
            } else if let Some(e) = cause.downcast_ref::<StorageError>() {
                Some(storage_code(e))
            } else if cause.is::<ConfigError>() {
                Some(EXIT_CONFIG)
            } else if cause.is::<ReconcileError>() {
                Some(EXIT_LOGICAL)
            } else {
                None
            }
        })
        .unwrap_or(EXIT_GENERAL)
}
