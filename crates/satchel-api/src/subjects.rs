//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Every caller sees every subject, by name |
//! | `POST`   | `/subjects` | Staff only. Body: [`NewSubject`] |
//! | `GET`    | `/subjects/{id}` | 404 if not found |
//! | `DELETE` | `/subjects/{id}` | Staff only. Cascades to coursework |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  RowId,
  kind::EntityKind,
  policy,
  store::RecordStore,
  subject::{NewSubject, Subject},
};

use crate::{
  auth::Caller,
  error::ApiError,
  extract::{Json, Path},
  scoped,
};

const KIND: EntityKind = EntityKind::Subject;

/// `GET /subjects`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let predicate = scoped::listing(&caller, KIND, params);
  let subjects = store
    .list_subjects(&predicate)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subjects))
}

/// `POST /subjects`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  if !policy::may_modify(&caller, KIND, None) {
    return Err(ApiError::Forbidden);
  }
  let subject = store.add_subject(body).await.map_err(ApiError::from_store)?;
  tracing::info!(subject_id = subject.subject_id, code = %subject.code, "subject created");
  Ok((StatusCode::CREATED, Json(subject)))
}

/// `GET /subjects/{id}`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<Json<Subject>, ApiError> {
  let subject = store
    .list_subjects(&scoped::single(&caller, KIND, id))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .next()
    .ok_or_else(|| scoped::not_found(KIND, id))?;
  Ok(Json(subject))
}

/// `DELETE /subjects/{id}`
pub async fn delete_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<RowId>,
) -> Result<StatusCode, ApiError> {
  if !policy::may_modify(&caller, KIND, None) {
    return Err(ApiError::Forbidden);
  }
  if !store.delete_subject(id).await.map_err(ApiError::from_store)? {
    return Err(scoped::not_found(KIND, id));
  }
  tracing::info!(subject_id = id, "subject deleted");
  Ok(StatusCode::NO_CONTENT)
}
