//! [`SqliteStore`]: the SQLite implementation of [`CrmStore`].

use std::path::Path;

use chrono::Utc;
use crm_core::{
  communication::{Communication, RelatedTo},
  entity::{Deleted, Entity, Id, ParentKind, Record, Version},
  store::CrmStore,
};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use crate::{
  Result,
  encode::{RawRecord, encode_dt, encode_entity, select_columns},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CRM store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// What an update transaction found when it went to write.
enum UpdateOutcome {
  Updated(RawRecord),
  Missing,
  Stale(Version),
  MissingParent(ParentKind, Id),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Full-row select of `E` with a trailing `WHERE` / `ORDER BY` clause.
  async fn select<E: Entity>(
    &self,
    clause: String,
    params: Vec<SqlValue>,
  ) -> Result<Vec<Record<E>>> {
    let sql = format!(
      "SELECT {} FROM {} {clause}",
      select_columns::<E>(),
      E::KIND.table()
    );
    let width = E::FIELDS.len();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            RawRecord::from_row(row, width)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record::<E>).collect()
  }
}

/// The first reference in `refs` whose parent row does not exist.
fn missing_parent(
  conn: &rusqlite::Connection,
  refs: &[(ParentKind, Id)],
) -> rusqlite::Result<Option<(ParentKind, Id)>> {
  for &(kind, id) in refs {
    let exists = conn
      .query_row(
        &format!("SELECT 1 FROM {} WHERE id = ?1", kind.entity_kind().table()),
        [id],
        |_| Ok(()),
      )
      .optional()?
      .is_some();
    if !exists {
      return Ok(Some((kind, id)));
    }
  }
  Ok(None)
}

fn integrity_violation(kind: ParentKind, id: Id) -> crate::Error {
  tracing::warn!(%kind, id, "rejected write referencing a missing parent");
  crm_core::Error::IntegrityViolation { kind: kind.entity_kind(), id }.into()
}

// ─── CrmStore impl ───────────────────────────────────────────────────────────

impl CrmStore for SqliteStore {
  type Error = crate::Error;

  async fn list<E: Entity>(&self) -> Result<Vec<Record<E>>> {
    self
      .select::<E>("ORDER BY created_at DESC, id DESC".to_owned(), vec![])
      .await
  }

  async fn get<E: Entity>(&self, id: Id) -> Result<Option<Record<E>>> {
    let mut found = self
      .select::<E>("WHERE id = ?1".to_owned(), vec![SqlValue::Integer(id)])
      .await?;
    Ok(found.pop())
  }

  async fn create<E: Entity>(&self, fields: E) -> Result<Record<E>> {
    fields.validate().map_err(crm_core::Error::from)?;

    let refs = fields.references();
    let values = encode_entity(&fields);
    let table = E::KIND.table();
    let width = E::FIELDS.len();

    let columns = E::FIELDS
      .iter()
      .map(|spec| spec.name)
      .collect::<Vec<_>>()
      .join(", ");
    let placeholders = (2..=width + 1)
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let insert_sql =
      format!("INSERT INTO {table} (created_at, {columns}) VALUES (?1, {placeholders})");
    let select_sql = format!("SELECT {} FROM {table} WHERE id = ?1", select_columns::<E>());
    let created_at = encode_dt(Utc::now());

    let outcome: std::result::Result<RawRecord, (ParentKind, Id)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(missing) = missing_parent(&tx, &refs)? {
          return Ok(Err(missing));
        }

        let mut params = Vec::with_capacity(width + 1);
        params.push(SqlValue::Text(created_at));
        params.extend(values);
        tx.execute(&insert_sql, rusqlite::params_from_iter(params))?;

        let id = tx.last_insert_rowid();
        let raw = tx.query_row(&select_sql, [id], |row| RawRecord::from_row(row, width))?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    match outcome {
      Ok(raw) => {
        let record = raw.into_record::<E>()?;
        tracing::debug!(kind = %E::KIND, id = record.id, "created");
        Ok(record)
      }
      Err((kind, id)) => Err(integrity_violation(kind, id)),
    }
  }

  async fn update<E: Entity>(
    &self,
    id: Id,
    fields: E,
    expected: Option<Version>,
  ) -> Result<Record<E>> {
    fields.validate().map_err(crm_core::Error::from)?;

    let refs = fields.references();
    let values = encode_entity(&fields);
    let table = E::KIND.table();
    let width = E::FIELDS.len();

    let assignments = E::FIELDS
      .iter()
      .enumerate()
      .map(|(i, spec)| format!("{} = ?{}", spec.name, i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let (now, id_at, version_at) = (width + 1, width + 2, width + 3);
    // updated_at never moves backwards, even if the clock does.
    let update_sql = format!(
      "UPDATE {table} SET {assignments},
         updated_at = MAX(COALESCE(updated_at, ?{now}), ?{now}),
         version    = version + 1
       WHERE id = ?{id_at} AND version = ?{version_at}"
    );
    let version_sql = format!("SELECT version FROM {table} WHERE id = ?1");
    let select_sql = format!("SELECT {} FROM {table} WHERE id = ?1", select_columns::<E>());
    let updated_at = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<Version> =
          tx.query_row(&version_sql, [id], |r| r.get(0)).optional()?;
        let Some(current) = current else {
          return Ok(UpdateOutcome::Missing);
        };
        if let Some(expected) = expected
          && expected != current
        {
          return Ok(UpdateOutcome::Stale(current));
        }
        if let Some((kind, parent_id)) = missing_parent(&tx, &refs)? {
          return Ok(UpdateOutcome::MissingParent(kind, parent_id));
        }

        let mut params = values;
        params.push(SqlValue::Text(updated_at));
        params.push(SqlValue::Integer(id));
        params.push(SqlValue::Integer(current));
        if tx.execute(&update_sql, rusqlite::params_from_iter(params))? == 0 {
          return Ok(UpdateOutcome::Missing);
        }

        let raw = tx.query_row(&select_sql, [id], |row| RawRecord::from_row(row, width))?;
        tx.commit()?;
        Ok(UpdateOutcome::Updated(raw))
      })
      .await?;

    match outcome {
      UpdateOutcome::Updated(raw) => {
        let record = raw.into_record::<E>()?;
        tracing::debug!(kind = %E::KIND, id, version = record.version, "updated");
        Ok(record)
      }
      UpdateOutcome::Missing => Err(crm_core::Error::NotFound { kind: E::KIND, id }.into()),
      UpdateOutcome::Stale(actual) => {
        tracing::warn!(kind = %E::KIND, id, ?expected, actual, "rejected stale update");
        Err(
          crm_core::Error::ConcurrencyConflict {
            kind: E::KIND,
            id,
            expected: expected.unwrap_or(actual),
            actual,
          }
          .into(),
        )
      }
      UpdateOutcome::MissingParent(kind, parent_id) => {
        Err(integrity_violation(kind, parent_id))
      }
    }
  }

  async fn delete<E: Entity>(&self, id: Id) -> Result<Deleted> {
    let table = E::KIND.table();
    let delete_sql = format!("DELETE FROM {table} WHERE id = ?1");
    let count_sql = E::KIND.as_parent().map(|parent| {
      format!(
        "SELECT COUNT(*) FROM communications WHERE {} = ?1",
        parent.foreign_key()
      )
    });

    let cascaded: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let cascaded = match &count_sql {
          Some(sql) => tx.query_row(sql, [id], |r| r.get::<_, i64>(0))? as usize,
          None => 0,
        };
        // Dependent communications go with the parent via ON DELETE CASCADE.
        if tx.execute(&delete_sql, [id])? == 0 {
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some(cascaded))
      })
      .await?;

    let Some(cascaded) = cascaded else {
      return Err(crm_core::Error::NotFound { kind: E::KIND, id }.into());
    };
    tracing::debug!(kind = %E::KIND, id, cascaded, "deleted");
    Ok(Deleted { kind: E::KIND, id, cascaded })
  }

  async fn communications_for(&self, parent: RelatedTo) -> Result<Vec<Record<Communication>>> {
    self
      .select::<Communication>(
        format!(
          "WHERE {} = ?1 ORDER BY communication_date DESC, id DESC",
          parent.kind.foreign_key()
        ),
        vec![SqlValue::Integer(parent.id)],
      )
      .await
  }

  async fn list_communications_by_date(&self) -> Result<Vec<Record<Communication>>> {
    self
      .select::<Communication>(
        "ORDER BY communication_date DESC, id DESC".to_owned(),
        vec![],
      )
      .await
  }
}
