//! Handlers for the communication endpoints that differ from the generic
//! record routes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/communications` | Newest `communication_date` first |
//! | `POST` | `/communications` | 201; `Location` points at the parent |
//! | `GET`  | `/communications/new` | Form defaults; `?contact_id=` etc. pre-fill the parent |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use crm_core::{
  Communication, FieldMap, Record, RelatedTo, communication::CommunicationForm, service,
  store::CrmStore,
};
use serde_json::{Map, Value};

use crate::{error::ApiError, etag::etag};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /communications`
pub async fn list_by_date<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Record<Communication>>>, ApiError>
where
  S: CrmStore,
{
  let records = store
    .list_communications_by_date()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /communications` — the new record is returned in the body; the
/// `Location` header sends the client back to the parent it was logged on.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
{
  let fields = FieldMap::from_json(body)?;
  let record = service::create_from_fields::<Communication, S>(&store, &fields)
    .await
    .map_err(ApiError::from_store)?;

  let parent = record.fields.related_to;
  let location = format!("/{}/{}", parent.kind.entity_kind().table(), parent.id);
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, location), (header::ETAG, etag(record.version))],
    Json(record),
  ))
}

// ─── Form ─────────────────────────────────────────────────────────────────────

/// `GET /communications/new[?contact_id=..|client_id=..|supplier_id=..|prospect_id=..]`
pub async fn form<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CommunicationForm>, ApiError>
where
  S: CrmStore,
{
  let prefill = RelatedTo::from_prefill(&FieldMap::from_strings(params))?;
  let form = service::communication_form(&*store, prefill)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(form))
}
