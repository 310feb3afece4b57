//! Handlers for `/grades` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/grades` | `?subject`, `?user`, `?min`, `?max`; newest first |
//! | `GET`    | `/grades/summary` | [`GradeSummary`] over the same rows |
//! | `POST`   | `/grades` | Body: [`CreateBody`] |
//! | `GET`    | `/grades/{id}` | |
//! | `DELETE` | `/grades/{id}` | Staff or the graded user |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  RowId, UserId,
  coursework::{Grade, NewGrade},
  kind::EntityKind,
  policy,
  principal::Principal,
  store::RecordStore,
  summary::{self, GradeSummary},
};
use serde::Deserialize;

use crate::{
  auth::Caller,
  error::ApiError,
  extract::{Json, Path},
  scoped,
};

const KIND: EntityKind = EntityKind::Grade;

async fn scoped_rows<S: RecordStore>(
  store: &S,
  caller: &Principal,
  params: BTreeMap<String, String>,
) -> Result<Vec<Grade>, ApiError> {
  let predicate = scoped::listing(caller, KIND, params);
  store.list_grades(&predicate).await.map_err(ApiError::from_store)
}

/// `GET /grades`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Grade>>, ApiError> {
  Ok(Json(scoped_rows(&*store, &caller, params).await?))
}

/// `GET /grades/summary`
pub async fn summary<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<GradeSummary>, ApiError> {
  let rows = scoped_rows(&*store, &caller, params).await?;
  Ok(Json(summary::grade_summary(&rows)))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Only honoured for staff; everyone else grades themselves.
  pub user_id:    Option<UserId>,
  pub subject_id: RowId,
  pub value:      f64,
  pub weight:     Option<f64>,
}

/// `POST /grades`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewGrade {
    user_id:    policy::attribute(&caller, body.user_id),
    subject_id: body.subject_id,
    value:      body.value,
    weight:     body.weight,
  };
  let grade = store.add_grade(input).await.map_err(ApiError::from_store)?;
  tracing::info!(grade_id = grade.grade_id, user_id = grade.user_id, "grade recorded");
  Ok((StatusCode::CREATED, Json(grade)))
}

async fn fetch<S: RecordStore>(
  store: &S,
  caller: &Principal,
  id: RowId,
) -> Result<Grade, ApiError> {
  store
    .list_grades(&scoped::single(caller, KIND, id))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| scoped::not_found(KIND, id))
}

/// `GET /grades/{id}`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<Json<Grade>, ApiError> {
  Ok(Json(fetch(&*store, &caller, id).await?))
}

/// `DELETE /grades/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  let existing = fetch(&*store, &caller, id).await?;
  if !policy::may_modify(&caller, KIND, Some(existing.user_id)) {
    return Err(ApiError::Forbidden);
  }
  if !store.delete_grade(id).await.map_err(ApiError::from_store)? {
    return Err(scoped::not_found(KIND, id));
  }
  tracing::info!(grade_id = id, "grade deleted");
  Ok(StatusCode::NO_CONTENT)
}
