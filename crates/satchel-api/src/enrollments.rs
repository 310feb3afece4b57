//! Handlers for `/enrollments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/enrollments` | `?user`, `?subject` |
//! | `POST`   | `/enrollments` | Body: [`CreateBody`]; 409 if already enrolled |
//! | `DELETE` | `/enrollments/{id}` | Staff or the enrolled user, else 403 |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  RowId, UserId,
  enrollment::{self, Enrollment, EnrollmentRole, Withdrawal},
  kind::EntityKind,
  store::RecordStore,
};
use serde::Deserialize;

use crate::{
  auth::Caller,
  error::ApiError,
  extract::{Json, Path},
  scoped,
};

const KIND: EntityKind = EntityKind::Enrollment;

/// `GET /enrollments`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  let predicate = scoped::listing(&caller, KIND, params);
  let rows = store
    .list_enrollments(&predicate)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub user_id:    Option<UserId>,
  pub subject_id: RowId,
  #[serde(default)]
  pub role:       EnrollmentRole,
}

/// `POST /enrollments`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let row = enrollment::enroll(
    &*store,
    &caller,
    body.user_id,
    body.subject_id,
    body.role,
  )
  .await
  .map_err(ApiError::from_store)?;
  tracing::info!(
    enrollment_id = row.enrollment_id,
    user_id = row.user_id,
    subject_id = row.subject_id,
    "enrolled"
  );
  Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /enrollments/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  match enrollment::withdraw(&*store, &caller, id)
    .await
    .map_err(ApiError::from_store)?
  {
    Withdrawal::Removed(row) => {
      tracing::info!(enrollment_id = id, user_id = row.user_id, "withdrawn");
      Ok(StatusCode::NO_CONTENT)
    }
    Withdrawal::Forbidden => {
      tracing::warn!(enrollment_id = id, user_id = caller.user_id, "withdrawal refused");
      Err(ApiError::Forbidden)
    }
    Withdrawal::NotFound => Err(scoped::not_found(KIND, id)),
  }
}
