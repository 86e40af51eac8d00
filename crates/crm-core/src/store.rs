//! The `CrmStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `crm-store-sqlite`).
//! Higher layers (`crm-api`, `crm-server`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  Error,
  communication::{Communication, RelatedTo},
  entity::{Deleted, Entity, Id, Record, Version},
  error::DomainError,
};

/// Abstraction over a CRM store backend.
///
/// Every operation is generic over the [`Entity`] descriptor, so one
/// implementation serves all five kinds. Each call is a single transaction;
/// nothing is partially written on failure.
///
/// Domain failures (validation, not found, conflict, integrity) are returned
/// as [`crate::Error`] wrapped in the backend's error type and can be
/// recovered through [`DomainError`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CrmStore: Send + Sync {
  type Error: std::error::Error + DomainError + From<Error> + Send + Sync + 'static;

  // ── Generic CRUD ──────────────────────────────────────────────────────

  /// All records of kind `E`, newest `created_at` first; ties go to the
  /// higher id.
  fn list<E: Entity>(
    &self,
  ) -> impl Future<Output = Result<Vec<Record<E>>, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get<E: Entity>(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Option<Record<E>>, Self::Error>> + Send + '_;

  /// Validate and insert. `created_at` is set by the store, `updated_at`
  /// starts empty and `version` at 1.
  ///
  /// Fails with [`Error::IntegrityViolation`] if a referenced parent does
  /// not exist.
  fn create<E: Entity>(
    &self,
    fields: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Validate and replace every field of an existing record.
  ///
  /// - [`Error::NotFound`] if `id` does not exist at write time.
  /// - [`Error::ConcurrencyConflict`] if `expected` is given and differs
  ///   from the stored version. Without `expected` the write is
  ///   last-writer-wins.
  fn update<E: Entity>(
    &self,
    id: Id,
    fields: E,
    expected: Option<Version>,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Hard-delete a record and every communication that references it.
  /// Returns [`Error::NotFound`] if `id` does not exist.
  fn delete<E: Entity>(
    &self,
    id: Id,
  ) -> impl Future<Output = Result<Deleted, Self::Error>> + Send + '_;

  // ── Communications ────────────────────────────────────────────────────

  /// Communications attached to `parent`, newest `communication_date` first.
  fn communications_for(
    &self,
    parent: RelatedTo,
  ) -> impl Future<Output = Result<Vec<Record<Communication>>, Self::Error>> + Send + '_;

  /// Every communication, newest `communication_date` first.
  fn list_communications_by_date(
    &self,
  ) -> impl Future<Output = Result<Vec<Record<Communication>>, Self::Error>> + Send + '_;
}
