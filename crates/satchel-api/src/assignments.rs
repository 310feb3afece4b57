//! Handlers for `/assignments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assignments` | `?subject`, `?status`, `?upcoming`, `?overdue` |
//! | `POST`   | `/assignments` | Body: [`CreateBody`] |
//! | `GET`    | `/assignments/{id}` | |
//! | `DELETE` | `/assignments/{id}` | Staff or the creator |
//! | `POST`   | `/assignments/{id}/status` | Body: `{"status":"done"}` |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use satchel_core::{
  RowId,
  coursework::{Assignment, AssignmentStatus, NewAssignment},
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

const KIND: EntityKind = EntityKind::Assignment;

/// `GET /assignments`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
  let predicate = scoped::listing(&caller, KIND, params);
  let rows = store
    .list_assignments(&predicate)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub subject_id:  RowId,
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub due_at:      DateTime<Utc>,
  /// Case-insensitive; defaults to pending.
  pub status:      Option<String>,
}

/// `POST /assignments`. The caller is recorded as the creator.
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let status = match body.status.as_deref() {
    Some(raw) => scoped::token("status", raw)?,
    None => AssignmentStatus::default(),
  };
  let input = NewAssignment {
    subject_id: body.subject_id,
    title: body.title,
    description: body.description,
    due_at: body.due_at,
    status,
    created_by: Some(caller.user_id),
  };
  let assignment = store
    .add_assignment(input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(assignment_id = assignment.assignment_id, "assignment created");
  Ok((StatusCode::CREATED, Json(assignment)))
}

// ─── Single row ──────────────────────────────────────────────────────────────

async fn fetch<S: RecordStore>(
  store: &S,
  caller: &Principal,
  id: RowId,
) -> Result<Assignment, ApiError> {
  store
    .list_assignments(&scoped::single(caller, KIND, id))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| scoped::not_found(KIND, id))
}

/// `GET /assignments/{id}`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(fetch(&*store, &caller, id).await?))
}

/// `DELETE /assignments/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  let existing = fetch(&*store, &caller, id).await?;
  if !policy::may_modify(&caller, KIND, existing.created_by) {
    tracing::debug!(assignment_id = id, user_id = caller.user_id, "delete refused");
    return Err(ApiError::Forbidden);
  }
  if !store.delete_assignment(id).await.map_err(ApiError::from_store)? {
    return Err(scoped::not_found(KIND, id));
  }
  tracing::info!(assignment_id = id, "assignment deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `POST /assignments/{id}/status`
pub async fn set_status<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Assignment>, ApiError> {
  let status: AssignmentStatus = scoped::token("status", &body.status)?;
  let existing = fetch(&*store, &caller, id).await?;
  if !policy::may_modify(&caller, KIND, existing.created_by) {
    return Err(ApiError::Forbidden);
  }
  let updated = store
    .set_assignment_status(id, status, Utc::now())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| scoped::not_found(KIND, id))?;
  let token: &'static str = status.into();
  tracing::info!(assignment_id = id, status = token, "assignment status set");
  Ok(Json(updated))
}
