//! Communications: the logged interactions attached to a parent record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::{
  Result,
  entity::{Entity, EntityKind, FieldSpec, Id, ParentKind},
  value::{Coded, FieldMap, FieldReader, missing},
};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Channel of a communication. Persisted as its integer code.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CommunicationKind {
  Email = 0,
  Phone = 1,
  Meeting = 2,
  #[default]
  Note = 3,
  Other = 4,
}

impl Coded for CommunicationKind {
  fn code(self) -> i64 { self as i64 }

  fn from_code(code: i64) -> Option<Self> {
    u8::try_from(code).ok().and_then(Self::from_repr)
  }
}

// ─── Parent reference ────────────────────────────────────────────────────────

/// The single parent a communication belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedTo {
  pub kind: ParentKind,
  pub id:   Id,
}

impl RelatedTo {
  pub fn new(kind: ParentKind, id: Id) -> Self { Self { kind, id } }

  /// Read a parent reference from the first populated `<kind>_id` key, in
  /// contact, client, supplier, prospect order. This is how create forms are
  /// pre-filled from query parameters.
  pub fn from_prefill(fields: &FieldMap) -> Result<Option<Self>> {
    let mut r = FieldReader::new(fields);
    let found = [
      ParentKind::Contact,
      ParentKind::Client,
      ParentKind::Supplier,
      ParentKind::Prospect,
    ]
    .into_iter()
    .find_map(|kind| r.integer(kind.foreign_key()).map(|id| Self { kind, id }));
    r.finish()?;
    Ok(found)
  }
}

// ─── Communication ───────────────────────────────────────────────────────────

/// A logged interaction with exactly one parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
  pub subject:            String,
  pub content:            String,
  #[serde(default)]
  pub kind:               CommunicationKind,
  pub communication_date: DateTime<Utc>,
  pub related_to:         RelatedTo,
}

impl Communication {
  /// A note dated now.
  pub fn new(
    subject: impl Into<String>,
    content: impl Into<String>,
    related_to: RelatedTo,
  ) -> Self {
    Self {
      subject: subject.into(),
      content: content.into(),
      kind: CommunicationKind::default(),
      communication_date: Utc::now(),
      related_to,
    }
  }
}

const RELATED_KIND: &str = "related_to_kind";
const RELATED_ID: &str = "related_to_id";

impl Entity for Communication {
  const KIND: EntityKind = EntityKind::Communication;
  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::text("subject").required().max(200),
    FieldSpec::text("content").required(),
    FieldSpec::integer("kind").required(),
    FieldSpec::timestamp("communication_date").required(),
    FieldSpec::reference("contact_id", ParentKind::Contact),
    FieldSpec::reference("client_id", ParentKind::Client),
    FieldSpec::reference("supplier_id", ParentKind::Supplier),
    FieldSpec::reference("prospect_id", ParentKind::Prospect),
  ];

  fn to_fields(&self) -> FieldMap {
    let mut fields = FieldMap::new()
      .with("subject", self.subject.clone())
      .with("content", self.content.clone())
      .with("kind", self.kind.code())
      .with("communication_date", self.communication_date);
    for kind in [
      ParentKind::Contact,
      ParentKind::Client,
      ParentKind::Supplier,
      ParentKind::Prospect,
    ] {
      let id = (kind == self.related_to.kind).then_some(self.related_to.id);
      fields.insert(kind.foreign_key(), id);
    }
    fields
  }

  /// Accepts the parent either as `related_to_kind` + `related_to_id` or as
  /// exactly one of the `<kind>_id` columns.
  fn from_fields(fields: &FieldMap) -> Result<Self> {
    let mut r = FieldReader::new(fields);
    let subject = r.required_text("subject");
    let content = r.required_text("content");
    let kind = r.coded("kind");
    let kind = r.require("kind", kind);
    let communication_date = r.timestamp("communication_date");
    let communication_date = r.require("communication_date", communication_date);

    let related_to = if r.is_present(RELATED_KIND) || r.is_present(RELATED_ID) {
      let kind = r
        .text(RELATED_KIND)
        .and_then(|k| k.trim().parse::<ParentKind>().ok());
      let id = r.integer(RELATED_ID);
      match (kind, id) {
        (Some(kind), Some(id)) => Some(RelatedTo { kind, id }),
        (None, _) => {
          r.reject("related_to", "kind must be contact, client, supplier or prospect")
        }
        (_, None) => r.reject("related_to", "id is required"),
      }
    } else {
      let set: Vec<RelatedTo> = [
        ParentKind::Contact,
        ParentKind::Client,
        ParentKind::Supplier,
        ParentKind::Prospect,
      ]
      .into_iter()
      .filter_map(|kind| r.integer(kind.foreign_key()).map(|id| RelatedTo { kind, id }))
      .collect();
      match set.as_slice() {
        [one] => Some(*one),
        [] => r.reject("related_to", "is required"),
        _ => r.reject("related_to", "must reference exactly one record"),
      }
    };

    r.finish()?;
    Ok(Self {
      subject,
      content,
      kind: kind.ok_or_else(|| missing("kind"))?,
      communication_date: communication_date.ok_or_else(|| missing("communication_date"))?,
      related_to: related_to.ok_or_else(|| missing("related_to"))?,
    })
  }

  /// A new communication is a note dated now unless told otherwise.
  fn fill_defaults(fields: &mut FieldMap) {
    fields.default_to("kind", CommunicationKind::default().code());
    fields.default_to("communication_date", Utc::now());
  }
}

// ─── Create form ─────────────────────────────────────────────────────────────

/// Defaults shown on an empty create form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationDraft {
  pub related_to:         Option<RelatedTo>,
  pub kind:               CommunicationKind,
  pub communication_date: DateTime<Utc>,
}

/// One selectable parent in a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentOption {
  pub id:    Id,
  pub label: String,
}

/// The picker lists for every parent kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
  pub contacts:  Vec<ParentOption>,
  pub clients:   Vec<ParentOption>,
  pub suppliers: Vec<ParentOption>,
  pub prospects: Vec<ParentOption>,
}

/// Everything a presentation layer needs to render the create form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationForm {
  pub draft:   CommunicationDraft,
  pub options: FormOptions,
}
