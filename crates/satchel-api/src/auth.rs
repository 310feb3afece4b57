//! The authenticated caller.
//!
//! Authentication happens outside this crate; whatever does it inserts a
//! [`Principal`] into the request extensions. Handlers take [`Caller`] to get
//! it back, and a request without one is rejected with 401.

use axum::{extract::FromRequestParts, http::request::Parts};
use satchel_core::principal::Principal;

use crate::{error::ApiError, extract::Json};

#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Principal>()
      .copied()
      .map(Caller)
      .ok_or(ApiError::Unauthorized)
  }
}

/// `GET /me`
pub async fn me(Caller(principal): Caller) -> Json<Principal> { Json(principal) }
