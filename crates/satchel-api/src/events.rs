//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | `?owner`, `?subject`, `?upcoming`; by start time |
//! | `POST`   | `/events` | Body: [`CreateBody`]; `ends_at` must follow `starts_at` |
//! | `GET`    | `/events/{id}` | |
//! | `DELETE` | `/events/{id}` | Staff or the owner |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use satchel_core::{
  RowId, UserId,
  event::{Event, NewEvent},
  kind::EntityKind,
  policy,
  principal::Principal,
  store::RecordStore,
};
use serde::Deserialize;

use crate::{
  auth::Caller,
  error::ApiError,
  extract::{Json, Path},
  scoped,
};

const KIND: EntityKind = EntityKind::Event;

/// `GET /events`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let predicate = scoped::listing(&caller, KIND, params);
  let events = store
    .list_events(&predicate)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub owner_id:   Option<UserId>,
  pub subject_id: Option<RowId>,
  pub title:      String,
  pub location:   Option<String>,
  pub starts_at:  DateTime<Utc>,
  pub ends_at:    DateTime<Utc>,
}

/// `POST /events`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewEvent {
    owner_id:   policy::attribute(&caller, body.owner_id),
    subject_id: body.subject_id,
    title:      body.title,
    location:   body.location,
    starts_at:  body.starts_at,
    ends_at:    body.ends_at,
  };
  let event = store.add_event(input).await.map_err(ApiError::from_store)?;
  tracing::info!(event_id = event.event_id, owner_id = event.owner_id, "event created");
  Ok((StatusCode::CREATED, Json(event)))
}

async fn fetch<S: RecordStore>(
  store: &S,
  caller: &Principal,
  id: RowId,
) -> Result<Event, ApiError> {
  store
    .list_events(&scoped::single(caller, KIND, id))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| scoped::not_found(KIND, id))
}

/// `GET /events/{id}`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(fetch(&*store, &caller, id).await?))
}

/// `DELETE /events/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  let existing = fetch(&*store, &caller, id).await?;
  if !policy::may_modify(&caller, KIND, Some(existing.owner_id)) {
    return Err(ApiError::Forbidden);
  }
  if !store.delete_event(id).await.map_err(ApiError::from_store)? {
    return Err(scoped::not_found(KIND, id));
  }
  tracing::info!(event_id = id, "event deleted");
  Ok(StatusCode::NO_CONTENT)
}
