//! Error type for `crm-store-sqlite`.

use crm_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure: validation, not found, conflict or integrity.
  #[error(transparent)]
  Core(#[from] crm_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column could not be decoded into its declared type.
  #[error("cannot decode {table}.{column}: {reason}")]
  Decode {
    table:  &'static str,
    column: &'static str,
    reason: String,
  },
}

impl DomainError for Error {
  fn domain(&self) -> Option<&crm_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
