//! Encoding and decoding helpers between domain values and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed nanosecond precision
//! and a `Z` suffix. That keeps every `DateTime<Utc>` exact, and text order
//! equals chronological order.
//! Decimals are stored as text to stay exact. Enumerations are stored as
//! their integer codes.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use crm_core::{
  entity::{Entity, FieldType, Id, Record, Version},
  value::{FieldMap, Value},
};
use rusqlite::types::Value as SqlValue;
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Decimal(d) => SqlValue::Text(d.to_string()),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Timestamp(t) => SqlValue::Text(encode_dt(*t)),
  }
}

/// Encode the columns of `entity` in `E::FIELDS` order.
pub fn encode_entity<E: Entity>(entity: &E) -> Vec<SqlValue> {
  let fields = entity.to_fields();
  E::FIELDS
    .iter()
    .map(|spec| encode_value(fields.get(spec.name)))
    .collect()
}

fn decode_value(
  table: &'static str,
  column: &'static str,
  ty: FieldType,
  raw: SqlValue,
) -> Result<Value> {
  let bad = |reason: String| Error::Decode { table, column, reason };

  match (ty, raw) {
    (_, SqlValue::Null) => Ok(Value::Null),
    (FieldType::Text, SqlValue::Text(s)) => Ok(Value::Text(s)),
    (FieldType::Integer | FieldType::Reference(_), SqlValue::Integer(i)) => {
      Ok(Value::Integer(i))
    }
    (FieldType::Decimal, SqlValue::Text(s)) => Decimal::from_str(&s)
      .map(Value::Decimal)
      .map_err(|e| bad(e.to_string())),
    (FieldType::Decimal, SqlValue::Integer(i)) => Ok(Value::Decimal(Decimal::from(i))),
    (FieldType::Timestamp, SqlValue::Text(s)) => decode_dt(&s).map(Value::Timestamp),
    (ty, other) => Err(bad(format!("unexpected {:?} for {ty:?}", other.data_type()))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list for a full-row select: bookkeeping columns, then `E::FIELDS`.
pub fn select_columns<E: Entity>() -> String {
  let mut cols = vec!["id", "version", "created_at", "updated_at"];
  cols.extend(E::FIELDS.iter().map(|spec| spec.name));
  cols.join(", ")
}

/// Raw values read directly from a full-row select.
pub struct RawRecord {
  pub id:         Id,
  pub version:    Version,
  pub created_at: String,
  pub updated_at: Option<String>,
  pub columns:    Vec<SqlValue>,
}

impl RawRecord {
  /// Read a row laid out by [`select_columns`].
  pub fn from_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      version:    row.get(1)?,
      created_at: row.get(2)?,
      updated_at: row.get(3)?,
      columns:    (0..width)
        .map(|i| row.get::<_, SqlValue>(4 + i))
        .collect::<rusqlite::Result<_>>()?,
    })
  }

  pub fn into_record<E: Entity>(self) -> Result<Record<E>> {
    let table = E::KIND.table();
    let fields = E::FIELDS
      .iter()
      .zip(self.columns)
      .map(|(spec, raw)| {
        decode_value(table, spec.name, spec.ty, raw).map(|v| (spec.name.to_owned(), v))
      })
      .collect::<Result<FieldMap>>()?;

    Ok(Record {
      id:         self.id,
      version:    self.version,
      created_at: decode_dt(&self.created_at)?,
      updated_at: self.updated_at.as_deref().map(decode_dt).transpose()?,
      fields:     E::from_fields(&fields)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::nanoseconds(1);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(encode_dt(early), "2024-01-01T09:00:00.000000000Z");
    assert_eq!(encode_dt(late), "2024-01-01T09:00:00.000000001Z");
  }

  #[test]
  fn timestamps_keep_full_precision() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
      + chrono::Duration::nanoseconds(123_456_789);
    assert_eq!(decode_dt(&encode_dt(at)).unwrap(), at);

    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn decimal_is_stored_as_exact_text() {
    let v = Value::Decimal(Decimal::new(1999, 2));
    assert_eq!(encode_value(&v), SqlValue::Text("19.99".into()));
  }

  #[test]
  fn text_in_integer_column_is_a_decode_error() {
    let err = decode_value("t", "c", FieldType::Integer, SqlValue::Text("x".into()))
      .unwrap_err();
    assert!(matches!(err, Error::Decode { column: "c", .. }));
  }
}
