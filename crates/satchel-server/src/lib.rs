//! HTTP server wiring for Satchel.
//!
//! Nests the [`satchel_api`] router under `/api` behind HTTP Basic
//! authentication, adds request tracing, and provisions the configured
//! accounts as users in the store.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use satchel_core::{principal::Principal, store::RecordStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{Account, Directory};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SATCHEL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub accounts:   Vec<AccountConfig>,
}

/// One login. Each is mirrored by a user row so records can reference it.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
  pub username:      String,
  /// argon2 PHC string; generate one with `--hash-password`.
  pub password_hash: String,
  #[serde(default)]
  pub staff:         bool,
  #[serde(default)]
  pub superuser:     bool,
}

// ─── Provisioning ────────────────────────────────────────────────────────────

/// Make sure every configured account has a user row and build the login
/// directory from the resulting identities.
pub async fn provision<S: RecordStore>(
  store: &S,
  accounts: &[AccountConfig],
) -> Result<Directory, S::Error> {
  let mut directory = Directory::default();
  for account in accounts {
    let user = store
      .ensure_user(account.username.clone(), account.staff, account.superuser)
      .await?;
    tracing::debug!(username = %user.username, user_id = user.user_id, "account ready");
    directory.insert(account.username.clone(), Account {
      password_hash: account.password_hash.clone(),
      principal:     Principal::from(&user),
    });
  }
  Ok(directory)
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: authenticated `/api` plus per-request tracing.
pub fn app<S>(store: Arc<S>, directory: Arc<Directory>) -> Router
where
  S: RecordStore + 'static,
{
  let api = satchel_api::api_router(store)
    .layer(middleware::from_fn_with_state(directory, auth::require_auth));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
