//! Store-agnostic helpers layered over [`CrmStore`].

use chrono::Utc;

use crate::{
  communication::{
    CommunicationDraft, CommunicationForm, CommunicationKind, FormOptions, ParentOption,
    RelatedTo,
  },
  entity::{Entity, Id, Parent, Record, Version},
  party::{Client, Contact, Prospect, Supplier},
  store::CrmStore,
  value::FieldMap,
};

/// Fill `E`'s create-time defaults into `fields`, bind, and create.
pub async fn create_from_fields<E, S>(store: &S, fields: &FieldMap) -> Result<Record<E>, S::Error>
where
  E: Entity,
  S: CrmStore,
{
  let mut fields = fields.clone();
  E::fill_defaults(&mut fields);
  let entity = E::from_fields(&fields)?;
  store.create(entity).await
}

/// Bind `fields` to `E` and replace record `id` with it. No defaults are
/// filled in, so a blank required field is a validation error.
pub async fn update_from_fields<E, S>(
  store: &S,
  id: Id,
  fields: &FieldMap,
  expected: Option<Version>,
) -> Result<Record<E>, S::Error>
where
  E: Entity,
  S: CrmStore,
{
  let entity = E::from_fields(fields)?;
  store.update(id, entity, expected).await
}

/// A parent record together with its communications, as shown on a details
/// screen.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Details<P> {
  #[serde(flatten)]
  pub record:         Record<P>,
  pub communications: Vec<Record<crate::Communication>>,
}

pub async fn details<P, S>(store: &S, id: Id) -> Result<Option<Details<P>>, S::Error>
where
  P: Parent,
  S: CrmStore,
{
  let Some(record) = store.get::<P>(id).await? else {
    return Ok(None);
  };
  let communications = store
    .communications_for(RelatedTo::new(P::PARENT, id))
    .await?;
  Ok(Some(Details { record, communications }))
}

/// Build the create-communication form: a draft carrying `prefill` plus the
/// picker lists for every parent kind.
pub async fn communication_form<S>(
  store: &S,
  prefill: Option<RelatedTo>,
) -> Result<CommunicationForm, S::Error>
where
  S: CrmStore,
{
  let options = FormOptions {
    contacts:  options::<Contact, S>(store).await?,
    clients:   options::<Client, S>(store).await?,
    suppliers: options::<Supplier, S>(store).await?,
    prospects: options::<Prospect, S>(store).await?,
  };
  Ok(CommunicationForm {
    draft: CommunicationDraft {
      related_to:         prefill,
      kind:               CommunicationKind::default(),
      communication_date: Utc::now(),
    },
    options,
  })
}

async fn options<P, S>(store: &S) -> Result<Vec<ParentOption>, S::Error>
where
  P: Parent,
  S: CrmStore,
{
  let records = store.list::<P>().await?;
  let mut options: Vec<ParentOption> = records
    .into_iter()
    .map(|r| ParentOption { id: r.id, label: r.fields.label() })
    .collect();
  options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
  Ok(options)
}
