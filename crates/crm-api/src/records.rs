//! Generic handlers mounted once per entity kind.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{kind}` | Newest first |
//! | `POST`   | `/{kind}` | Body: flat JSON object; 201 + `Location` + `ETag` |
//! | `GET`    | `/{kind}/:id` | Parents include their communications |
//! | `PUT`    | `/{kind}/:id` | Full replace; optional `If-Match` |
//! | `DELETE` | `/{kind}/:id` | Cascades to communications |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use crm_core::{
  Deleted, Entity, FieldMap, Id, Parent, Record, service, store::CrmStore,
};
use serde_json::{Map, Value};

use crate::{
  error::ApiError,
  etag::{etag, expected_version},
};

fn not_found<E: Entity>(id: Id) -> ApiError {
  ApiError::NotFound(format!("{} {id} not found", E::KIND))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{kind}`
pub async fn list<E, S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Record<E>>>, ApiError>
where
  E: Entity,
  S: CrmStore,
{
  let records = store.list::<E>().await.map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /{kind}` — returns 201 + the stored record.
pub async fn create<E, S>(
  State(store): State<Arc<S>>,
  Json(body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError>
where
  E: Entity,
  S: CrmStore,
{
  let fields = FieldMap::from_json(body)?;
  let record = service::create_from_fields::<E, S>(&store, &fields)
    .await
    .map_err(ApiError::from_store)?;
  let location = format!("/{}/{}", E::KIND.table(), record.id);
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, location), (header::ETAG, etag(record.version))],
    Json(record),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{kind}/:id`
pub async fn get_one<E, S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError>
where
  E: Entity,
  S: CrmStore,
{
  let record = store
    .get::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found::<E>(id))?;
  Ok(([(header::ETAG, etag(record.version))], Json(record)))
}

/// `GET /{kind}/:id` for parent kinds: the record plus its communications.
pub async fn details<P, S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError>
where
  P: Parent,
  S: CrmStore,
{
  let details = service::details::<P, S>(&store, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found::<P>(id))?;
  Ok(([(header::ETAG, etag(details.record.version))], Json(details)))
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// `PUT /{kind}/:id` — every field is replaced. With `If-Match`, a stale
/// version is refused with 412.
pub async fn replace<E, S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Id>,
  headers: HeaderMap,
  Json(body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError>
where
  E: Entity,
  S: CrmStore,
{
  let expected = expected_version(&headers)?;
  let fields = FieldMap::from_json(body)?;
  let record = service::update_from_fields::<E, S>(&store, id, &fields, expected)
    .await
    .map_err(ApiError::from_store)?;
  Ok(([(header::ETAG, etag(record.version))], Json(record)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /{kind}/:id`
pub async fn remove<E, S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Id>,
) -> Result<Json<Deleted>, ApiError>
where
  E: Entity,
  S: CrmStore,
{
  let deleted = store.delete::<E>(id).await.map_err(ApiError::from_store)?;
  Ok(Json(deleted))
}
