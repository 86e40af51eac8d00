//! JSON REST API for the CRM store.
//!
//! Exposes an axum [`Router`] backed by any [`crm_core::store::CrmStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", crm_api::api_router(store.clone()))
//! ```
//!
//! Create payloads are flat JSON objects keyed by field name. A
//! communication's parent may be given as `"related_to": {"kind", "id"}` or
//! as exactly one of `contact_id`, `client_id`, `supplier_id`, `prospect_id`.

pub mod communications;
pub mod error;
pub mod etag;
pub mod records;

use std::sync::Arc;

use axum::{Router, routing::get};
use crm_core::{
  Client, Communication, Contact, Parent, Prospect, Supplier, store::CrmStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CrmStore + 'static,
{
  Router::new()
    .merge(parent_routes::<Contact, S>())
    .merge(parent_routes::<Client, S>())
    .merge(parent_routes::<Supplier, S>())
    .merge(parent_routes::<Prospect, S>())
    // Communications
    .route(
      "/communications",
      get(communications::list_by_date::<S>).post(communications::create::<S>),
    )
    .route("/communications/new", get(communications::form::<S>))
    .route(
      "/communications/{id}",
      get(records::get_one::<Communication, S>)
        .put(records::replace::<Communication, S>)
        .delete(records::remove::<Communication, S>),
    )
    .with_state(store)
}

fn parent_routes<P, S>() -> Router<Arc<S>>
where
  P: Parent,
  S: CrmStore + 'static,
{
  let collection = format!("/{}", P::KIND.table());
  let member = format!("{collection}/{{id}}");
  Router::new()
    .route(&collection, get(records::list::<P, S>).post(records::create::<P, S>))
    .route(
      &member,
      get(records::details::<P, S>)
        .put(records::replace::<P, S>)
        .delete(records::remove::<P, S>),
    )
}
