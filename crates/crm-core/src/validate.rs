//! Field-level validation shared by every entity kind.

use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{FieldSpec, Format},
  value::{FieldMap, Value},
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email regex")
});

// Digits with the usual separators, an optional leading `+` and an optional
// extension suffix.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^\+?[0-9 ()./-]*[0-9][0-9 ()./-]*(\s*(x|ext\.?)\s*[0-9]+)?$")
    .expect("phone regex")
});

pub fn is_email(s: &str) -> bool { EMAIL_RE.is_match(s) }

pub fn is_phone(s: &str) -> bool {
  PHONE_RE.is_match(s) && s.chars().filter(char::is_ascii_digit).count() >= 3
}

// ─── FieldErrors ─────────────────────────────────────────────────────────────

/// Field name → messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.entry(field.into()).or_default().push(message.into());
  }

  pub fn get(&self, field: &str) -> Option<&Vec<String>> { self.0.get(field) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn into_result(self) -> Result<(), FieldErrors> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field} {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Check `fields` against the declared column rules.
///
/// Lengths are counted in characters. Format rules apply only to non-blank
/// text and see it exactly as it will be stored; binding through
/// [`crate::value::FieldReader`] has already trimmed it.
pub fn check(specs: &[FieldSpec], fields: &FieldMap) -> Result<(), FieldErrors> {
  let mut errors = FieldErrors::default();

  for spec in specs {
    let value = fields.get(spec.name);

    if value.is_blank() {
      if spec.required {
        errors.add(spec.name, "is required");
      }
      continue;
    }

    let Value::Text(text) = value else { continue };

    if let Some(max) = spec.max_len
      && text.chars().count() > max
    {
      errors.add(spec.name, format!("must be at most {max} characters"));
    }

    match spec.format {
      Some(Format::Email) if !is_email(text) => {
        errors.add(spec.name, "is not a valid email address")
      }
      Some(Format::Phone) if !is_phone(text) => {
        errors.add(spec.name, "is not a valid phone number")
      }
      _ => {}
    }
  }

  errors.into_result()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entity::FieldSpec;

  const SPECS: &[FieldSpec] = &[
    FieldSpec::text("name").required().max(5),
    FieldSpec::text("email").max(200).format(Format::Email),
    FieldSpec::text("phone").max(20).format(Format::Phone),
  ];

  #[test]
  fn email_grammar() {
    assert!(is_email("a@acme.com"));
    assert!(is_email("first.last+tag@mail.example.org"));
    assert!(!is_email("acme.com"));
    assert!(!is_email("a@acme"));
    assert!(!is_email("a b@acme.com"));
    assert!(!is_email("a@@acme.com"));
  }

  #[test]
  fn phone_grammar() {
    assert!(is_phone("+33 1 23 45 67 89"));
    assert!(is_phone("(555) 123-4567"));
    assert!(is_phone("555.123.4567 ext. 12"));
    assert!(!is_phone("call me"));
    assert!(!is_phone("12"));
    assert!(!is_phone("555-CALL-NOW"));
  }

  #[test]
  fn required_rejects_whitespace() {
    let fields = FieldMap::new().with("name", "   ");
    let errors = check(SPECS, &fields).unwrap_err();
    assert_eq!(errors.get("name").unwrap(), &vec!["is required".to_string()]);
  }

  #[test]
  fn length_counts_characters_not_bytes() {
    let fields = FieldMap::new().with("name", "Zoë√");
    assert!(check(SPECS, &fields).is_ok());

    let fields = FieldMap::new().with("name", "Zoë Lee");
    let errors = check(SPECS, &fields).unwrap_err();
    assert!(errors.get("name").is_some());
  }

  #[test]
  fn every_failing_field_is_reported() {
    let fields = FieldMap::new()
      .with("email", "not-an-email")
      .with("phone", "nope");
    let errors = check(SPECS, &fields).unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(errors.get("name").is_some());
    assert!(errors.get("email").is_some());
    assert!(errors.get("phone").is_some());
  }

  #[test]
  fn formats_check_the_stored_text() {
    let fields = FieldMap::new().with("name", "Jo").with("email", " jo@example.com ");
    let errors = check(SPECS, &fields).unwrap_err();
    assert!(errors.get("email").is_some());
  }

  #[test]
  fn optional_blank_fields_pass() {
    let fields = FieldMap::new().with("name", "Jo").with("email", "");
    assert!(check(SPECS, &fields).is_ok());
  }
}
