//! HTTP Basic authentication against the configured accounts.
//!
//! A successful check inserts the account's [`Principal`] into the request
//! extensions, where `satchel_api::Caller` picks it up.

use std::{collections::HashMap, sync::Arc};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use satchel_api::ApiError;
use satchel_core::principal::Principal;

/// A login the server accepts.
#[derive(Debug, Clone)]
pub struct Account {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub principal:     Principal,
}

/// Username → account.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  accounts: HashMap<String, Account>,
}

impl Directory {
  pub fn insert(&mut self, username: impl Into<String>, account: Account) {
    self.accounts.insert(username.into(), account);
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }

  /// Check the `Authorization: Basic` header and return who it belongs to.
  pub fn verify(&self, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (username, password) =
      creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    let account = self.accounts.get(username).ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(account.principal)
  }
}

/// Middleware guarding every API route.
pub async fn require_auth(
  State(directory): State<Arc<Directory>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let principal = directory.verify(req.headers()).inspect_err(|_| {
    tracing::debug!(path = %req.uri().path(), "rejected credentials");
  })?;
  req.extensions_mut().insert(principal);
  Ok(next.run(req).await)
}

/// Hash `password` into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn directory(password: &str) -> Directory {
    let mut dir = Directory::default();
    dir.insert("user", Account {
      password_hash: hash_password(password).unwrap(),
      principal:     Principal::member(7),
    });
    dir
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let dir = directory("secret");
    let principal = dir.verify(&headers(&basic("user", "secret"))).unwrap();
    assert_eq!(principal, Principal::member(7));
  }

  #[test]
  fn wrong_password() {
    let dir = directory("secret");
    assert!(matches!(
      dir.verify(&headers(&basic("user", "wrong"))),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn unknown_user() {
    let dir = directory("secret");
    assert!(dir.verify(&headers(&basic("mallory", "secret"))).is_err());
  }

  #[test]
  fn missing_header() {
    let dir = directory("secret");
    assert!(matches!(
      dir.verify(&HeaderMap::new()),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let dir = directory("secret");
    assert!(dir.verify(&headers("Basic !!!not-base64!!!")).is_err());
  }

  #[test]
  fn password_may_contain_colons() {
    let dir = directory("a:b:c");
    assert!(dir.verify(&headers(&basic("user", "a:b:c"))).is_ok());
  }
}
