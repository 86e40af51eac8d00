//! Core types and trait definitions for the CRM store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod communication;
pub mod entity;
pub mod error;
pub mod party;
pub mod service;
pub mod store;
pub mod validate;
pub mod value;

pub use communication::{Communication, CommunicationKind, RelatedTo};
pub use entity::{Deleted, Entity, EntityKind, Id, Parent, ParentKind, Record, Version};
pub use error::{DomainError, Error, Result};
pub use party::{Client, Contact, Prospect, ProspectStatus, Supplier};
pub use store::CrmStore;
pub use value::{FieldMap, Value};
