//! Plain-text time tracking.
//! Parses timelog files into records, evaluates and checks them, and applies
//! targeted edits that leave the rest of the file untouched.

pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod parser;
pub mod period;
pub mod query;
pub mod reconcile;
pub mod scanner;
pub mod storage;
pub mod warnings;

pub use error::AppError;
pub use format::{Serialiser, serialise_records};
pub use parser::{ParseErrors, Parsed, parse};
pub use reconcile::{Edit, Strategy, reconcile};
