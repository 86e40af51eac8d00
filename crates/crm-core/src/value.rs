//! Untyped field payloads.
//!
//! A [`FieldMap`] is the plain field-name → value mapping that presentation
//! layers hand to the store (form posts, JSON bodies). Entities convert to and
//! from it through [`crate::entity::Entity`]; [`FieldReader`] does the
//! lenient model-binding style coercion on the way in.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Error, Result, validate::FieldErrors};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Integer(i64),
  Decimal(Decimal),
  Text(String),
  Timestamp(DateTime<Utc>),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// `true` for null and for text that is empty or whitespace only.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Null => true,
      Self::Text(s) => s.trim().is_empty(),
      _ => false,
    }
  }
}

impl From<Option<String>> for Value {
  fn from(v: Option<String>) -> Self { v.map_or(Self::Null, Self::Text) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<Option<i64>> for Value {
  fn from(v: Option<i64>) -> Self { v.map_or(Self::Null, Self::Integer) }
}

impl From<Option<Decimal>> for Value {
  fn from(v: Option<Decimal>) -> Self { v.map_or(Self::Null, Self::Decimal) }
}

impl From<DateTime<Utc>> for Value {
  fn from(v: DateTime<Utc>) -> Self { Self::Timestamp(v) }
}

// ─── FieldMap ────────────────────────────────────────────────────────────────

/// Field name → value. Missing keys read as [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, Value>);

impl FieldMap {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(name.into(), value.into());
  }

  /// Builder-style [`FieldMap::insert`].
  pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn get(&self, name: &str) -> &Value {
    self.0.get(name).unwrap_or(&Value::Null)
  }

  /// Insert `value` only when `name` is blank.
  pub fn default_to(&mut self, name: &str, value: impl Into<Value>) {
    if self.get(name).is_blank() {
      self.insert(name, value);
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Build a map from string pairs, as submitted by an HTML form.
  pub fn from_strings<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    Self(
      pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::Text(v.into())))
        .collect(),
    )
  }

  /// Build a map from a JSON object.
  ///
  /// Scalars map directly. A nested object is flattened one level with `_`
  /// as separator, so `{"related_to": {"kind": "contact", "id": 3}}` becomes
  /// `related_to_kind` and `related_to_id`.
  pub fn from_json(object: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
    let mut map = Self::new();
    let mut errors = FieldErrors::default();

    for (key, value) in object {
      match value {
        serde_json::Value::Object(inner) => {
          for (sub, v) in inner {
            let name = format!("{key}_{sub}");
            match json_scalar(v) {
              Some(v) => map.insert(name, v),
              None => errors.add(name, "must be a string, number or null"),
            }
          }
        }
        other => match json_scalar(other) {
          Some(v) => map.insert(key, v),
          None => errors.add(key, "must be a string, number or null"),
        },
      }
    }

    errors.into_result()?;
    Ok(map)
  }
}

impl FromIterator<(String, Value)> for FieldMap {
  fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
    Self(iter.into_iter().collect())
  }
}

fn json_scalar(v: serde_json::Value) -> Option<Value> {
  match v {
    serde_json::Value::Null => Some(Value::Null),
    serde_json::Value::String(s) => Some(Value::Text(s)),
    serde_json::Value::Number(n) => match n.as_i64() {
      Some(i) => Some(Value::Integer(i)),
      // Go through the textual form so 0.1 stays 0.1.
      None => Decimal::from_str(&n.to_string())
        .or_else(|_| Decimal::from_scientific(&n.to_string()))
        .ok()
        .map(Value::Decimal),
    },
    serde_json::Value::Bool(_) | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
      None
    }
  }
}

/// A validation error naming `name` as required.
pub(crate) fn missing(name: &str) -> Error {
  let mut errors = FieldErrors::default();
  errors.add(name, "is required");
  Error::Validation(errors)
}

// ─── Enumerations stored as integer codes ────────────────────────────────────

/// An enumeration persisted as an integer code and accepted either as that
/// code or as its name.
pub trait Coded: Copy + FromStr {
  fn code(self) -> i64;
  fn from_code(code: i64) -> Option<Self>;
}

// ─── FieldReader ─────────────────────────────────────────────────────────────

/// Typed, error-accumulating access to a [`FieldMap`].
///
/// Every accessor records a field error instead of failing fast, so a caller
/// gets the complete error set in one round trip. Blank optional values read
/// as `None`.
pub struct FieldReader<'a> {
  fields: &'a FieldMap,
  errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
  pub fn new(fields: &'a FieldMap) -> Self {
    Self { fields, errors: FieldErrors::default() }
  }

  pub fn is_present(&self, name: &str) -> bool { !self.fields.get(name).is_blank() }

  /// Text with surrounding whitespace removed; blank reads as `None`.
  pub fn text(&mut self, name: &str) -> Option<String> {
    let fields = self.fields;
    match fields.get(name) {
      v if v.is_blank() => None,
      Value::Text(s) => Some(s.trim().to_owned()),
      Value::Integer(i) => Some(i.to_string()),
      Value::Decimal(d) => Some(d.to_string()),
      Value::Timestamp(t) => Some(t.to_rfc3339()),
      Value::Null => None,
    }
  }

  /// Like [`FieldReader::text`], but a missing value reads as an empty
  /// string; the required-field rule reports it during validation.
  pub fn required_text(&mut self, name: &str) -> String {
    self.text(name).unwrap_or_default()
  }

  pub fn integer(&mut self, name: &str) -> Option<i64> {
    let fields = self.fields;
    match fields.get(name) {
      v if v.is_blank() => None,
      Value::Integer(i) => Some(*i),
      Value::Text(s) => self.parse(name, s.trim(), "must be a whole number"),
      _ => self.reject(name, "must be a whole number"),
    }
  }

  pub fn decimal(&mut self, name: &str) -> Option<Decimal> {
    let fields = self.fields;
    match fields.get(name) {
      v if v.is_blank() => None,
      Value::Decimal(d) => Some(*d),
      Value::Integer(i) => Some(Decimal::from(*i)),
      Value::Text(s) => self.parse(name, s.trim(), "must be a number"),
      _ => self.reject(name, "must be a number"),
    }
  }

  /// Accepts RFC 3339 or a `datetime-local` style value (interpreted as UTC).
  pub fn timestamp(&mut self, name: &str) -> Option<DateTime<Utc>> {
    let fields = self.fields;
    match fields.get(name) {
      v if v.is_blank() => None,
      Value::Timestamp(t) => Some(*t),
      Value::Text(s) => {
        let s = s.trim();
        let parsed = DateTime::parse_from_rfc3339(s)
          .map(|dt| dt.with_timezone(&Utc))
          .ok()
          .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
              .iter()
              .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
              .map(|naive| naive.and_utc())
          });
        match parsed {
          Some(t) => Some(t),
          None => self.reject(name, "must be a date and time"),
        }
      }
      _ => self.reject(name, "must be a date and time"),
    }
  }

  pub fn coded<T: Coded>(&mut self, name: &str) -> Option<T> {
    let fields = self.fields;
    let found = match fields.get(name) {
      v if v.is_blank() => return None,
      Value::Integer(i) => T::from_code(*i),
      Value::Text(s) => {
        let s = s.trim();
        match s.parse::<i64>() {
          Ok(code) => T::from_code(code),
          Err(_) => s.parse::<T>().ok(),
        }
      }
      _ => None,
    };
    match found {
      Some(v) => Some(v),
      None => self.reject(name, "is not a recognised value"),
    }
  }

  /// Pass `value` through, recording "is required" when `name` was left
  /// blank. A value that was present but unreadable already carries its own
  /// error.
  pub fn require<T>(&mut self, name: &str, value: Option<T>) -> Option<T> {
    if value.is_none() && !self.is_present(name) {
      return self.reject(name, "is required");
    }
    value
  }

  /// Record an error against `name`; always returns `None`.
  pub fn reject<T>(&mut self, name: &str, message: &str) -> Option<T> {
    self.errors.add(name, message);
    None
  }

  /// `Err(Error::Validation)` if any accessor recorded an error.
  pub fn finish(self) -> Result<()> {
    self.errors.into_result().map_err(Error::from)
  }

  fn parse<T: FromStr>(&mut self, name: &str, s: &str, message: &str) -> Option<T> {
    match s.parse() {
      Ok(v) => Some(v),
      Err(_) => self.reject(name, message),
    }
  }
}
