//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `satchel-store-sqlite`).
//! Higher layers (`satchel-api`, `satchel-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Listings take a [`Predicate`] that the caller has already scoped with
//! [`crate::policy::scope`]; the store applies it verbatim and orders rows by
//! [`crate::kind::EntityKind::sort_order`]. Uniqueness and cascade rules are
//! enforced by the backend atomically.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  RowId, UserId,
  attendance::{Attendance, NewAttendance},
  coursework::{Assignment, AssignmentStatus, Grade, NewAssignment, NewGrade},
  enrollment::{Enrollment, NewEnrollment},
  event::{Event, NewEvent},
  predicate::Predicate,
  principal::User,
  subject::{NewSubject, Subject},
};

/// Backend errors must expose the domain failure they carry, if any, so the
/// presentation layer can tell a conflict from an outage.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Satchel record store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user called `username`, creating it first if needed. The
  /// staff and superuser flags are updated to the given values.
  fn ensure_user(
    &self,
    username: String,
    is_staff: bool,
    is_superuser: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Delete a user together with every row they own. Returns `false` if no
  /// such user existed.
  fn delete_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Fails with [`crate::Error::DuplicateSubjectCode`] if the code is taken.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn list_subjects<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + 'a;

  /// Cascades to assignments, grades, attendance and enrollments; events keep
  /// existing with their subject cleared.
  fn delete_subject(
    &self,
    subject_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  fn add_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  fn list_assignments<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + 'a;

  /// Set the status and touch `updated_at`. Returns `None` if not found.
  fn set_assignment_status(
    &self,
    assignment_id: RowId,
    status: AssignmentStatus,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  fn delete_assignment(
    &self,
    assignment_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Grades ────────────────────────────────────────────────────────────

  fn add_grade(
    &self,
    input: NewGrade,
  ) -> impl Future<Output = Result<Grade, Self::Error>> + Send + '_;

  fn list_grades<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Grade>, Self::Error>> + Send + 'a;

  fn delete_grade(
    &self,
    grade_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Fails with [`crate::Error::DuplicateAttendance`] if the user already has
  /// a row for that subject and date.
  fn record_attendance(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;

  fn list_attendance<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + 'a;

  fn delete_attendance(
    &self,
    attendance_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Validates the event with [`NewEvent::validate`] before writing.
  fn add_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn list_events<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  fn delete_event(
    &self,
    event_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Fails with [`crate::Error::AlreadyEnrolled`] if the pair exists.
  fn add_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn list_enrollments<'a>(
    &'a self,
    predicate: &'a Predicate,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + 'a;

  fn delete_enrollment(
    &self,
    enrollment_id: RowId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
