//! Handlers for `/attendance` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/attendance` | `?user`, `?subject`, `?status`, `?start`, `?end` |
//! | `GET`    | `/attendance/summary` | [`AttendanceSummary`] over the same rows |
//! | `POST`   | `/attendance` | Body: [`CreateBody`]; 409 on a repeat day |
//! | `GET`    | `/attendance/{id}` | |
//! | `DELETE` | `/attendance/{id}` | Staff or the attending user |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use satchel_core::{
  RowId, UserId,
  attendance::{Attendance, NewAttendance},
  kind::EntityKind,
  policy,
  principal::Principal,
  store::RecordStore,
  summary::{self, AttendanceSummary},
};
use serde::Deserialize;

use crate::{
  auth::Caller,
  error::ApiError,
  extract::{Json, Path},
  scoped,
};

const KIND: EntityKind = EntityKind::Attendance;

async fn scoped_rows<S: RecordStore>(
  store: &S,
  caller: &Principal,
  params: BTreeMap<String, String>,
) -> Result<Vec<Attendance>, ApiError> {
  let predicate = scoped::listing(caller, KIND, params);
  store
    .list_attendance(&predicate)
    .await
    .map_err(ApiError::from_store)
}

/// `GET /attendance`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
  Ok(Json(scoped_rows(&*store, &caller, params).await?))
}

/// `GET /attendance/summary`
pub async fn summary<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<AttendanceSummary>, ApiError> {
  let rows = scoped_rows(&*store, &caller, params).await?;
  Ok(Json(summary::attendance_summary(&rows)))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub user_id:    Option<UserId>,
  pub subject_id: RowId,
  pub date:       NaiveDate,
  /// `present`, `absent`, `late` or `excused`, any case.
  pub status:     String,
}

/// `POST /attendance`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewAttendance {
    user_id:    policy::attribute(&caller, body.user_id),
    subject_id: body.subject_id,
    date:       body.date,
    status:     scoped::token("status", &body.status)?,
  };
  let row = store
    .record_attendance(input)
    .await
    .map_err(|e| {
      let err = ApiError::from_store(e);
      if matches!(err, ApiError::Conflict { .. }) {
        tracing::debug!(error = %err, "attendance already recorded");
      }
      err
    })?;
  tracing::info!(attendance_id = row.attendance_id, user_id = row.user_id, "attendance recorded");
  Ok((StatusCode::CREATED, Json(row)))
}

async fn fetch<S: RecordStore>(
  store: &S,
  caller: &Principal,
  id: RowId,
) -> Result<Attendance, ApiError> {
  store
    .list_attendance(&scoped::single(caller, KIND, id))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| scoped::not_found(KIND, id))
}

/// `GET /attendance/{id}`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<Json<Attendance>, ApiError> {
  Ok(Json(fetch(&*store, &caller, id).await?))
}

/// `DELETE /attendance/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  let existing = fetch(&*store, &caller, id).await?;
  if !policy::may_modify(&caller, KIND, Some(existing.user_id)) {
    return Err(ApiError::Forbidden);
  }
  if !store.delete_attendance(id).await.map_err(ApiError::from_store)? {
    return Err(scoped::not_found(KIND, id));
  }
  tracing::info!(attendance_id = id, "attendance deleted");
  Ok(StatusCode::NO_CONTENT)
}
