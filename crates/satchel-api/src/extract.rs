//! `Json` and `Path` extractors that reject through [`ApiError`].
//!
//! axum's own extractors answer malformed input with a plain-text 4xx. These
//! wrappers turn the same failures into a 400 attributed to the offending
//! field, like any other validation error.

use axum::{
  body::Bytes,
  extract::{FromRequest, FromRequestParts, Request},
  http::{HeaderMap, header, request::Parts},
  response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ApiError;

// ─── Json ────────────────────────────────────────────────────────────────────

/// A JSON request body or response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(';').next())
    .map(str::trim)
    .is_some_and(|mime| {
      mime == "application/json"
        || (mime.starts_with("application/") && mime.ends_with("+json"))
    })
}

/// The request field a deserialisation error points at. A missing field is
/// reported by name rather than by the path of its parent object.
fn field_of(err: &serde_path_to_error::Error<serde_json::Error>) -> String {
  if !err.inner().is_data() {
    return "body".to_owned();
  }

  let mut path = err.path().to_string();
  if path == "." {
    path.clear();
  }

  let message = err.inner().to_string();
  if let Some(missing) = message
    .strip_prefix("missing field `")
    .and_then(|rest| rest.split('`').next())
  {
    if !path.is_empty() {
      path.push('.');
    }
    path.push_str(missing);
  }

  if path.is_empty() { "body".to_owned() } else { path }
}

impl<T, S> FromRequest<S> for Json<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    if !is_json(req.headers()) {
      return Err(ApiError::invalid(
        "body",
        "expected a request with `Content-Type: application/json`",
      ));
    }

    let bytes = Bytes::from_request(req, state)
      .await
      .map_err(|e| ApiError::invalid("body", e.body_text()))?;

    let de = &mut serde_json::Deserializer::from_slice(&bytes);
    serde_path_to_error::deserialize(de).map(Json).map_err(|e| {
      let field = field_of(&e);
      ApiError::invalid(field, e.into_inner().to_string())
    })
  }
}

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}

// ─── Path ────────────────────────────────────────────────────────────────────

/// A path parameter. Every Satchel route has at most one, named `id`.
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    axum::extract::Path::<T>::from_request_parts(parts, state)
      .await
      .map(|axum::extract::Path(value)| Path(value))
      .map_err(|e| ApiError::invalid("id", e.body_text()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, serde::Deserialize)]
  #[allow(dead_code)]
  struct Body {
    title: String,
    inner: Inner,
  }

  #[derive(Debug, serde::Deserialize)]
  #[allow(dead_code)]
  struct Inner {
    value: f64,
  }

  fn field(json: &str) -> String {
    let de = &mut serde_json::Deserializer::from_str(json);
    let err = serde_path_to_error::deserialize::<_, Body>(de).unwrap_err();
    field_of(&err)
  }

  #[test]
  fn missing_field_is_named() {
    assert_eq!(field(r#"{"inner":{"value":1}}"#), "title");
    assert_eq!(field(r#"{"title":"x","inner":{}}"#), "inner.value");
  }

  #[test]
  fn wrong_type_points_at_field() {
    assert_eq!(field(r#"{"title":"x","inner":{"value":"high"}}"#), "inner.value");
  }

  #[test]
  fn syntax_error_blames_body() {
    assert_eq!(field("{not json"), "body");
  }

  #[test]
  fn json_content_types() {
    let mut h = HeaderMap::new();
    assert!(!is_json(&h));
    h.insert(header::CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
    assert!(is_json(&h));
    h.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
    assert!(!is_json(&h));
  }
}
