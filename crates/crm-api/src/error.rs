//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use crm_core::{DomainError, validate::FieldErrors};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Field-level failures, rendered as `{"error", "fields"}`.
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("conflict: {0}")]
  Conflict(String),

  /// `If-Match` named a version that is no longer current.
  #[error("precondition failed: {0}")]
  PreconditionFailed(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing the domain failure it carries if any.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match err.domain() {
      Some(domain) => domain.clone().into(),
      None => ApiError::Store(Box::new(err)),
    }
  }
}

impl From<crm_core::Error> for ApiError {
  fn from(err: crm_core::Error) -> Self {
    use crm_core::Error as E;
    match err {
      E::Validation(fields) => ApiError::Validation(fields),
      e @ E::NotFound { .. } => ApiError::NotFound(e.to_string()),
      e @ E::ConcurrencyConflict { .. } => ApiError::PreconditionFailed(e.to_string()),
      e @ E::IntegrityViolation { .. } => ApiError::Conflict(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": "validation failed", "fields": fields }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::PreconditionFailed(m) => {
        (StatusCode::PRECONDITION_FAILED, json!({ "error": m }))
      }
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": e.to_string() }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
