//! Error types for `crm-core`.

use thiserror::Error;

use crate::{
  entity::{EntityKind, Id, Version},
  validate::FieldErrors,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// One or more fields failed validation; nothing was written.
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: Id },

  /// The caller's version token no longer matches the stored record.
  #[error("{kind} {id} was modified concurrently (expected version {expected}, found {actual})")]
  ConcurrencyConflict {
    kind:     EntityKind,
    id:       Id,
    expected: Version,
    actual:   Version,
  },

  /// A communication points at a parent row that does not exist.
  #[error("referenced {kind} {id} does not exist")]
  IntegrityViolation { kind: EntityKind, id: Id },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can recover the domain
/// failure (not found, conflict, ...) behind a storage error.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

impl From<FieldErrors> for Error {
  fn from(errors: FieldErrors) -> Self { Self::Validation(errors) }
}
