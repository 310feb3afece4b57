//! JSON REST API for Satchel.
//!
//! Exposes an axum [`Router`] backed by any [`satchel_core::store::RecordStore`].
//! Every handler expects the authenticated [`Principal`] in the request
//! extensions (see [`auth::Caller`]); authentication itself, TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", satchel_api::api_router(store.clone()))
//! ```
//!
//! [`Principal`]: satchel_core::principal::Principal

pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod enrollments;
pub mod error;
pub mod events;
pub mod extract;
pub mod grades;
mod scoped;
pub mod subjects;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use satchel_core::store::RecordStore;

pub use auth::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>).delete(subjects::delete_one::<S>),
    )
    // Assignments
    .route(
      "/assignments",
      get(assignments::list::<S>).post(assignments::create::<S>),
    )
    .route(
      "/assignments/{id}",
      get(assignments::get_one::<S>).delete(assignments::delete_one::<S>),
    )
    .route("/assignments/{id}/status", post(assignments::set_status::<S>))
    // Grades
    .route("/grades", get(grades::list::<S>).post(grades::create::<S>))
    .route("/grades/summary", get(grades::summary::<S>))
    .route(
      "/grades/{id}",
      get(grades::get_one::<S>).delete(grades::delete_one::<S>),
    )
    // Attendance
    .route(
      "/attendance",
      get(attendance::list::<S>).post(attendance::create::<S>),
    )
    .route("/attendance/summary", get(attendance::summary::<S>))
    .route(
      "/attendance/{id}",
      get(attendance::get_one::<S>).delete(attendance::delete_one::<S>),
    )
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>).delete(events::delete_one::<S>),
    )
    // Enrollments
    .route(
      "/enrollments",
      get(enrollments::list::<S>).post(enrollments::create::<S>),
    )
    .route("/enrollments/{id}", delete(enrollments::delete_one::<S>))
    // Caller
    .route("/me", get(auth::me))
    .with_state(store)
}
