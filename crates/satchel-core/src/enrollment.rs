//! Enrollments and the guard that governs creating and removing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

use crate::{
  RowId, UserId,
  kind::EntityKind,
  policy,
  predicate::Predicate,
  principal::Principal,
  store::RecordStore,
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnrollmentRole {
  #[default]
  Student,
  Teacher,
}

/// Membership of a user in a subject. Unique per `(user_id, subject_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id: RowId,
  pub user_id:       UserId,
  pub subject_id:    RowId,
  pub role:          EnrollmentRole,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`RecordStore::add_enrollment`].
#[derive(Debug, Clone)]
pub struct NewEnrollment {
  pub user_id:    UserId,
  pub subject_id: RowId,
  pub role:       EnrollmentRole,
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// Result of [`withdraw`]. Refusal is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
  Removed(Enrollment),
  /// The caller is neither staff nor the enrolled user; nothing was changed.
  Forbidden,
  NotFound,
}

/// Enroll a user in a subject on behalf of `caller`.
///
/// Non-staff callers always enroll themselves. A second enrollment for the
/// same pair fails with [`crate::Error::AlreadyEnrolled`] from the store.
pub async fn enroll<S: RecordStore>(
  store: &S,
  caller: &Principal,
  requested_user: Option<UserId>,
  subject_id: RowId,
  role: EnrollmentRole,
) -> Result<Enrollment, S::Error> {
  let input = NewEnrollment {
    user_id: policy::attribute(caller, requested_user),
    subject_id,
    role,
  };
  store.add_enrollment(input).await
}

/// Remove an enrollment if `caller` is staff or the enrolled user.
///
/// The ownership check looks at the row regardless of visibility, so a
/// non-owner learns the request was refused rather than that the row is
/// missing.
pub async fn withdraw<S: RecordStore>(
  store: &S,
  caller: &Principal,
  enrollment_id: RowId,
) -> Result<Withdrawal, S::Error> {
  let lookup = Predicate::all().with_id(enrollment_id);
  let Some(existing) = store.list_enrollments(&lookup).await?.into_iter().next()
  else {
    return Ok(Withdrawal::NotFound);
  };

  if !policy::may_modify(caller, EntityKind::Enrollment, Some(existing.user_id))
  {
    return Ok(Withdrawal::Forbidden);
  }

  if store.delete_enrollment(enrollment_id).await? {
    Ok(Withdrawal::Removed(existing))
  } else {
    // Removed concurrently between the lookup and the delete.
    Ok(Withdrawal::NotFound)
  }
}
