//! The entity-kind descriptor that every CRUD operation is generic over.
//!
//! Each record type declares its kind, its column layout with validation
//! rules, and how it converts to and from a [`FieldMap`]. Storage backends and
//! the HTTP layer work against [`Entity`] alone and never special-case a kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{Display, EnumString};

use crate::{
  Result,
  validate::{self, FieldErrors},
  value::FieldMap,
};

/// Surrogate identity assigned by the store.
pub type Id = i64;

/// Optimistic-concurrency token; starts at 1, bumped on every update.
pub type Version = i64;

// ─── Kinds ───────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
  Contact,
  Client,
  Supplier,
  Prospect,
  Communication,
}

impl EntityKind {
  /// Table name, also used as the collection path segment.
  pub fn table(self) -> &'static str {
    match self {
      Self::Contact => "contacts",
      Self::Client => "clients",
      Self::Supplier => "suppliers",
      Self::Prospect => "prospects",
      Self::Communication => "communications",
    }
  }

  /// `Some` for the kinds communications can be attached to.
  pub fn as_parent(self) -> Option<ParentKind> {
    match self {
      Self::Contact => Some(ParentKind::Contact),
      Self::Client => Some(ParentKind::Client),
      Self::Supplier => Some(ParentKind::Supplier),
      Self::Prospect => Some(ParentKind::Prospect),
      Self::Communication => None,
    }
  }
}

/// The kinds a communication can be attached to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ParentKind {
  Contact,
  Client,
  Supplier,
  Prospect,
}

impl ParentKind {
  pub fn entity_kind(self) -> EntityKind {
    match self {
      Self::Contact => EntityKind::Contact,
      Self::Client => EntityKind::Client,
      Self::Supplier => EntityKind::Supplier,
      Self::Prospect => EntityKind::Prospect,
    }
  }

  /// The foreign-key column on `communications` that points at this kind.
  pub fn foreign_key(self) -> &'static str {
    match self {
      Self::Contact => "contact_id",
      Self::Client => "client_id",
      Self::Supplier => "supplier_id",
      Self::Prospect => "prospect_id",
    }
  }
}

// ─── Column descriptors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  Text,
  Integer,
  Decimal,
  Timestamp,
  /// Integer foreign key to a parent row.
  Reference(ParentKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Email,
  Phone,
}

/// One persisted column and its validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
  pub name:     &'static str,
  pub ty:       FieldType,
  pub required: bool,
  pub max_len:  Option<usize>,
  pub format:   Option<Format>,
}

impl FieldSpec {
  const fn new(name: &'static str, ty: FieldType) -> Self {
    Self { name, ty, required: false, max_len: None, format: None }
  }

  pub const fn text(name: &'static str) -> Self { Self::new(name, FieldType::Text) }

  pub const fn integer(name: &'static str) -> Self { Self::new(name, FieldType::Integer) }

  pub const fn decimal(name: &'static str) -> Self { Self::new(name, FieldType::Decimal) }

  pub const fn timestamp(name: &'static str) -> Self {
    Self::new(name, FieldType::Timestamp)
  }

  pub const fn reference(name: &'static str, to: ParentKind) -> Self {
    Self::new(name, FieldType::Reference(to))
  }

  pub const fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub const fn max(mut self, len: usize) -> Self {
    self.max_len = Some(len);
    self
  }

  pub const fn format(mut self, format: Format) -> Self {
    self.format = Some(format);
    self
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A record type the store can persist.
pub trait Entity:
  std::fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: EntityKind;

  /// Persisted columns, excluding the bookkeeping columns every table has
  /// (`id`, `version`, `created_at`, `updated_at`).
  const FIELDS: &'static [FieldSpec];

  /// Column values keyed by [`FieldSpec::name`].
  fn to_fields(&self) -> FieldMap;

  /// Bind a record from an untyped payload. Only coercion problems and
  /// blank fields the type cannot represent are reported here; the declared
  /// rules run in [`Entity::validate`].
  fn from_fields(fields: &FieldMap) -> Result<Self>;

  /// Fill the values a new record starts with into blank `fields`. Applied
  /// on create only; an update must carry every required value.
  fn fill_defaults(_fields: &mut FieldMap) {}

  fn validate(&self) -> Result<(), FieldErrors> {
    validate::check(Self::FIELDS, &self.to_fields())
  }

  /// Parent rows this record points at, as declared by its reference
  /// columns.
  fn references(&self) -> Vec<(ParentKind, Id)> {
    let fields = self.to_fields();
    Self::FIELDS
      .iter()
      .filter_map(|spec| match (spec.ty, fields.get(spec.name)) {
        (FieldType::Reference(kind), crate::value::Value::Integer(id)) => {
          Some((kind, *id))
        }
        _ => None,
      })
      .collect()
  }
}

/// An entity that communications can be attached to.
pub trait Parent: Entity {
  const PARENT: ParentKind;

  /// Short human-readable label for pickers.
  fn label(&self) -> String;
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted entity with its store-assigned bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
  pub id:         Id,
  pub version:    Version,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  /// `None` until the first successful update.
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub fields:     E,
}

/// Outcome of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
  pub kind:     EntityKind,
  pub id:       Id,
  /// Communications removed along with the parent.
  pub cascaded: usize,
}
