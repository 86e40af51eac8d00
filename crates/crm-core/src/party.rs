//! The four parent record types: people and the companies we deal with.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::{
  Result,
  entity::{Entity, EntityKind, FieldSpec, Format, Parent, ParentKind},
  value::{Coded, FieldMap, FieldReader, missing},
};

// Column rules shared by the company-shaped kinds.
const COMPANY_NAME: FieldSpec = FieldSpec::text("company_name").required().max(200);
const CONTACT_PERSON: FieldSpec = FieldSpec::text("contact_person").max(100);
const EMAIL: FieldSpec = FieldSpec::text("email").max(200).format(Format::Email);
const PHONE: FieldSpec = FieldSpec::text("phone").max(20).format(Format::Phone);
const ADDRESS: FieldSpec = FieldSpec::text("address").max(500);
const TAX_NUMBER: FieldSpec = FieldSpec::text("tax_number").max(50);

// ─── Contact ─────────────────────────────────────────────────────────────────

/// An individual person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub first_name: String,
  pub last_name:  String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub company:    Option<String>,
  pub position:   Option<String>,
  pub address:    Option<String>,
}

impl Contact {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      ..Self::default()
    }
  }
}

impl Entity for Contact {
  const KIND: EntityKind = EntityKind::Contact;
  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::text("first_name").required().max(100),
    FieldSpec::text("last_name").required().max(100),
    EMAIL,
    PHONE,
    FieldSpec::text("company").max(100),
    FieldSpec::text("position").max(100),
    ADDRESS,
  ];

  fn to_fields(&self) -> FieldMap {
    FieldMap::new()
      .with("first_name", self.first_name.clone())
      .with("last_name", self.last_name.clone())
      .with("email", self.email.clone())
      .with("phone", self.phone.clone())
      .with("company", self.company.clone())
      .with("position", self.position.clone())
      .with("address", self.address.clone())
  }

  fn from_fields(fields: &FieldMap) -> Result<Self> {
    let mut r = FieldReader::new(fields);
    let contact = Self {
      first_name: r.required_text("first_name"),
      last_name:  r.required_text("last_name"),
      email:      r.text("email"),
      phone:      r.text("phone"),
      company:    r.text("company"),
      position:   r.text("position"),
      address:    r.text("address"),
    };
    r.finish()?;
    Ok(contact)
  }
}

impl Parent for Contact {
  const PARENT: ParentKind = ParentKind::Contact;

  fn label(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// A company that buys from us.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
  pub company_name:   String,
  pub contact_person: Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub address:        Option<String>,
  pub tax_number:     Option<String>,
  pub credit_limit:   Option<Decimal>,
}

impl Client {
  pub fn new(company_name: impl Into<String>) -> Self {
    Self { company_name: company_name.into(), ..Self::default() }
  }
}

impl Entity for Client {
  const KIND: EntityKind = EntityKind::Client;
  const FIELDS: &'static [FieldSpec] = &[
    COMPANY_NAME,
    CONTACT_PERSON,
    EMAIL,
    PHONE,
    ADDRESS,
    TAX_NUMBER,
    FieldSpec::decimal("credit_limit"),
  ];

  fn to_fields(&self) -> FieldMap {
    FieldMap::new()
      .with("company_name", self.company_name.clone())
      .with("contact_person", self.contact_person.clone())
      .with("email", self.email.clone())
      .with("phone", self.phone.clone())
      .with("address", self.address.clone())
      .with("tax_number", self.tax_number.clone())
      .with("credit_limit", self.credit_limit)
  }

  fn from_fields(fields: &FieldMap) -> Result<Self> {
    let mut r = FieldReader::new(fields);
    let client = Self {
      company_name:   r.required_text("company_name"),
      contact_person: r.text("contact_person"),
      email:          r.text("email"),
      phone:          r.text("phone"),
      address:        r.text("address"),
      tax_number:     r.text("tax_number"),
      credit_limit:   r.decimal("credit_limit"),
    };
    r.finish()?;
    Ok(client)
  }
}

impl Parent for Client {
  const PARENT: ParentKind = ParentKind::Client;

  fn label(&self) -> String { self.company_name.clone() }
}

// ─── Supplier ────────────────────────────────────────────────────────────────

/// A company we buy from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
  pub company_name:   String,
  pub contact_person: Option<String>,
  pub email:          Option<String>,
  pub phone:          Option<String>,
  pub address:        Option<String>,
  pub tax_number:     Option<String>,
  pub category:       Option<String>,
}

impl Supplier {
  pub fn new(company_name: impl Into<String>) -> Self {
    Self { company_name: company_name.into(), ..Self::default() }
  }
}

impl Entity for Supplier {
  const KIND: EntityKind = EntityKind::Supplier;
  const FIELDS: &'static [FieldSpec] = &[
    COMPANY_NAME,
    CONTACT_PERSON,
    EMAIL,
    PHONE,
    ADDRESS,
    TAX_NUMBER,
    FieldSpec::text("category").max(100),
  ];

  fn to_fields(&self) -> FieldMap {
    FieldMap::new()
      .with("company_name", self.company_name.clone())
      .with("contact_person", self.contact_person.clone())
      .with("email", self.email.clone())
      .with("phone", self.phone.clone())
      .with("address", self.address.clone())
      .with("tax_number", self.tax_number.clone())
      .with("category", self.category.clone())
  }

  fn from_fields(fields: &FieldMap) -> Result<Self> {
    let mut r = FieldReader::new(fields);
    let supplier = Self {
      company_name:   r.required_text("company_name"),
      contact_person: r.text("contact_person"),
      email:          r.text("email"),
      phone:          r.text("phone"),
      address:        r.text("address"),
      tax_number:     r.text("tax_number"),
      category:       r.text("category"),
    };
    r.finish()?;
    Ok(supplier)
  }
}

impl Parent for Supplier {
  const PARENT: ParentKind = ParentKind::Supplier;

  fn label(&self) -> String { self.company_name.clone() }
}

// ─── Prospect ────────────────────────────────────────────────────────────────

/// Sales-pipeline stage of a prospect. Persisted as its integer code.
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
pub enum ProspectStatus {
  #[default]
  New = 0,
  Contacted = 1,
  Qualified = 2,
  ProposalSent = 3,
  Negotiation = 4,
  Won = 5,
  Lost = 6,
}

impl Coded for ProspectStatus {
  fn code(self) -> i64 { self as i64 }

  fn from_code(code: i64) -> Option<Self> {
    u8::try_from(code).ok().and_then(Self::from_repr)
  }
}

/// A company we are trying to win as a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
  pub company_name:    String,
  pub contact_person:  Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub address:         Option<String>,
  #[serde(default)]
  pub status:          ProspectStatus,
  pub estimated_value: Option<Decimal>,
  pub notes:           Option<String>,
}

impl Prospect {
  pub fn new(company_name: impl Into<String>) -> Self {
    Self { company_name: company_name.into(), ..Self::default() }
  }
}

impl Entity for Prospect {
  const KIND: EntityKind = EntityKind::Prospect;
  const FIELDS: &'static [FieldSpec] = &[
    COMPANY_NAME,
    CONTACT_PERSON,
    EMAIL,
    PHONE,
    ADDRESS,
    FieldSpec::integer("status").required(),
    FieldSpec::decimal("estimated_value"),
    FieldSpec::text("notes").max(500),
  ];

  fn to_fields(&self) -> FieldMap {
    FieldMap::new()
      .with("company_name", self.company_name.clone())
      .with("contact_person", self.contact_person.clone())
      .with("email", self.email.clone())
      .with("phone", self.phone.clone())
      .with("address", self.address.clone())
      .with("status", self.status.code())
      .with("estimated_value", self.estimated_value)
      .with("notes", self.notes.clone())
  }

  fn from_fields(fields: &FieldMap) -> Result<Self> {
    let mut r = FieldReader::new(fields);
    let status = r.coded("status");
    let status = r.require("status", status);
    let prospect = Self {
      company_name:    r.required_text("company_name"),
      contact_person:  r.text("contact_person"),
      email:           r.text("email"),
      phone:           r.text("phone"),
      address:         r.text("address"),
      status:          ProspectStatus::default(),
      estimated_value: r.decimal("estimated_value"),
      notes:           r.text("notes"),
    };
    r.finish()?;
    Ok(Self { status: status.ok_or_else(|| missing("status"))?, ..prospect })
  }

  fn fill_defaults(fields: &mut FieldMap) {
    fields.default_to("status", ProspectStatus::default().code());
  }
}

impl Parent for Prospect {
  const PARENT: ParentKind = ParentKind::Prospect;

  fn label(&self) -> String { self.company_name.clone() }
}

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;
  use crate::Error;

  #[test]
  fn contact_binds_from_form_strings() {
    let fields = FieldMap::from_strings([
      ("first_name", "Jo"),
      ("last_name", "Lee"),
      ("email", ""),
      ("company", "Acme"),
    ]);
    let contact = Contact::from_fields(&fields).unwrap();
    assert_eq!(contact.first_name, "Jo");
    assert_eq!(contact.email, None);
    assert_eq!(contact.company.as_deref(), Some("Acme"));
    assert!(contact.validate().is_ok());
  }

  #[test]
  fn contact_missing_names_fail_validation() {
    let contact = Contact::from_fields(&FieldMap::new()).unwrap();
    let errors = contact.validate().unwrap_err();
    assert!(errors.get("first_name").is_some());
    assert!(errors.get("last_name").is_some());
  }

  #[test]
  fn client_fields_round_trip() {
    let client = Client {
      company_name: "Acme".into(),
      email: Some("a@acme.com".into()),
      credit_limit: Some(Decimal::new(250_000, 2)),
      ..Client::default()
    };
    assert_eq!(Client::from_fields(&client.to_fields()).unwrap(), client);
  }

  #[test]
  fn client_rejects_bad_email_and_long_tax_number() {
    let client = Client {
      company_name: "Acme".into(),
      email: Some("acme.com".into()),
      tax_number: Some("X".repeat(51)),
      ..Client::default()
    };
    let errors = client.validate().unwrap_err();
    assert!(errors.get("email").is_some());
    assert!(errors.get("tax_number").is_some());
  }

  #[test]
  fn prospect_status_accepts_code_or_name() {
    let by_code = FieldMap::from_strings([("company_name", "Initech"), ("status", "5")]);
    assert_eq!(Prospect::from_fields(&by_code).unwrap().status, ProspectStatus::Won);

    let by_name =
      FieldMap::from_strings([("company_name", "Initech"), ("status", "Proposal_Sent")]);
    assert_eq!(
      Prospect::from_fields(&by_name).unwrap().status,
      ProspectStatus::ProposalSent
    );

    let mut blank = FieldMap::from_strings([("company_name", "Initech")]);
    Prospect::fill_defaults(&mut blank);
    assert_eq!(Prospect::from_fields(&blank).unwrap().status, ProspectStatus::New);
  }

  #[test]
  fn prospect_update_without_status_is_rejected() {
    let fields = FieldMap::from_strings([("company_name", "Initech")]);
    let err = Prospect::from_fields(&fields).unwrap_err();
    assert!(matches!(err, Error::Validation(f) if f.get("status").is_some()));
  }

  #[test]
  fn contact_text_is_trimmed_before_validation() {
    let fields = FieldMap::from_strings([
      ("first_name", " Jo "),
      ("last_name", "Lee"),
      ("email", " jo@example.com "),
    ]);
    let contact = Contact::from_fields(&fields).unwrap();
    assert_eq!(contact.first_name, "Jo");
    assert_eq!(contact.email.as_deref(), Some("jo@example.com"));
    assert!(contact.validate().is_ok());
  }

  #[test]
  fn prospect_rejects_unknown_status() {
    let fields = FieldMap::from_strings([("company_name", "Initech"), ("status", "42")]);
    let err = Prospect::from_fields(&fields).unwrap_err();
    assert!(matches!(err, Error::Validation(f) if f.get("status").is_some()));
  }

  #[test]
  fn supplier_company_name_limit() {
    let supplier = Supplier::new("S".repeat(201));
    let errors = supplier.validate().unwrap_err();
    assert!(errors.get("company_name").is_some());
  }
}
