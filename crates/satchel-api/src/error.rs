//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use satchel_core::{ErrorKind, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("{field}: {message}")]
  /// `field` is a path into the request, e.g. `ends_at` or `items[0].id`.
  Invalid {
    field:   String,
    message: String,
  },

  #[error("{field}: {message}")]
  Conflict {
    field:   &'static str,
    message: String,
  },

  #[error("forbidden")]
  Forbidden,

  #[error("authentication required")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Sort a backend error into the HTTP taxonomy by the domain failure it
  /// carries. Anything without one is an internal error.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    let domain = e.domain().map(|d| (d.kind(), d.field(), d.to_string()));
    match domain {
      Some((ErrorKind::Validation, field, message)) => {
        ApiError::Invalid { field: field.to_owned(), message }
      }
      Some((ErrorKind::Conflict, field, message)) => {
        ApiError::Conflict { field, message }
      }
      None => ApiError::Store(Box::new(e)),
    }
  }

  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    ApiError::Invalid { field: field.into(), message: message.into() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Invalid { field, message } => (
        StatusCode::BAD_REQUEST,
        json!({ "error": message, "field": field }),
      ),
      ApiError::Conflict { field, message } => (
        StatusCode::CONFLICT,
        json!({ "error": message, "field": field }),
      ),
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        json!({ "error": "you do not have permission to perform this action" }),
      ),
      ApiError::Unauthorized => {
        let mut resp = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        resp.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static(r#"Basic realm="satchel""#),
        );
        return resp;
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
