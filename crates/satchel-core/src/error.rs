//! Error types for `satchel-core`.
//!
//! Only caller-input failures live here: validation of a write and the
//! uniqueness conflicts the store enforces. Malformed filters and empty scopes
//! are never errors.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{RowId, UserId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("{field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("{field} refers to a record that does not exist")]
  UnknownReference { field: &'static str },

  #[error("user {user_id} is already enrolled in subject {subject_id}")]
  AlreadyEnrolled { user_id: UserId, subject_id: RowId },

  #[error(
    "attendance for user {user_id} in subject {subject_id} on {date} is \
     already recorded"
  )]
  DuplicateAttendance {
    user_id:    UserId,
    subject_id: RowId,
    date:       NaiveDate,
  },

  #[error("subject code {0:?} is already in use")]
  DuplicateSubjectCode(String),
}

/// Coarse classification used by the presentation layer to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  Conflict,
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation { .. } | Self::UnknownReference { .. } => {
        ErrorKind::Validation
      }
      Self::AlreadyEnrolled { .. }
      | Self::DuplicateAttendance { .. }
      | Self::DuplicateSubjectCode(_) => ErrorKind::Conflict,
    }
  }

  /// The request field the error is attributed to.
  pub fn field(&self) -> &'static str {
    match self {
      Self::Validation { field, .. } | Self::UnknownReference { field } => field,
      Self::AlreadyEnrolled { .. } => "subject_id",
      Self::DuplicateAttendance { .. } => "date",
      Self::DuplicateSubjectCode(_) => "code",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
