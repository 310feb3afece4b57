//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use satchel_core::{
  Error as CoreError,
  attendance::{AttendanceStatus, NewAttendance},
  coursework::{AssignmentStatus, NewAssignment, NewGrade},
  enrollment::{self, EnrollmentRole, Withdrawal},
  event::NewEvent,
  kind::EntityKind,
  policy,
  predicate::Predicate,
  principal::{Principal, User},
  query::{self, RequestContext},
  store::RecordStore,
  subject::{NewSubject, Subject},
  summary,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

struct Fixture {
  store:   SqliteStore,
  alice:   User,
  bob:     User,
  teacher: User,
  math:    Subject,
  physics: Subject,
}

async fn fixture() -> Fixture {
  let s = store().await;
  let alice = s.ensure_user("alice".into(), false, false).await.unwrap();
  let bob = s.ensure_user("bob".into(), false, false).await.unwrap();
  let teacher = s.ensure_user("teacher".into(), true, false).await.unwrap();
  let math = s.add_subject(subject("MS", "Math")).await.unwrap();
  let physics = s.add_subject(subject("PH", "Physics")).await.unwrap();
  Fixture { store: s, alice, bob, teacher, math, physics }
}

fn subject(code: &str, name: &str) -> NewSubject {
  NewSubject { code: code.into(), name: name.into(), color: None }
}

fn ctx(pairs: &[(&str, &str)]) -> RequestContext {
  let params: BTreeMap<String, String> = pairs
    .iter()
    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
    .collect();
  RequestContext::from_params(params)
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 9, d).unwrap() }

async fn grade(f: &Fixture, user: &User, subject: &Subject, value: f64) {
  f.store
    .add_grade(NewGrade {
      user_id: user.user_id,
      subject_id: subject.subject_id,
      value,
      weight: None,
    })
    .await
    .unwrap();
}

async fn mark(
  f: &Fixture,
  user: &User,
  subject: &Subject,
  date: NaiveDate,
  status: AttendanceStatus,
) {
  f.store
    .record_attendance(NewAttendance {
      user_id: user.user_id,
      subject_id: subject.subject_id,
      date,
      status,
    })
    .await
    .unwrap();
}

fn event(owner: &User, start_in_hours: i64) -> NewEvent {
  let starts_at = Utc::now() + Duration::hours(start_in_hours);
  NewEvent {
    owner_id:   owner.user_id,
    subject_id: None,
    title:      "Study group".into(),
    location:   None,
    starts_at,
    ends_at:    starts_at + Duration::hours(1),
  }
}

/// The scoped and filtered predicate a request from `who` would run.
fn scoped(who: &User, kind: EntityKind, params: &[(&str, &str)]) -> Predicate {
  let principal = Principal::from(who);
  query::build(policy::scope(&principal, kind), kind, &ctx(params))
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_user_is_idempotent_and_updates_flags() {
  let s = store().await;
  let first = s.ensure_user("carol".into(), false, false).await.unwrap();
  let again = s.ensure_user("carol".into(), true, false).await.unwrap();
  assert_eq!(first.user_id, again.user_id);
  assert!(again.is_staff);
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subjects_are_listed_by_name() {
  let f = fixture().await;
  f.store.add_subject(subject("AR", "Art")).await.unwrap();
  let names: Vec<_> = f
    .store
    .list_subjects(&Predicate::all())
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Art", "Math", "Physics"]);
}

#[tokio::test]
async fn duplicate_subject_code_is_a_conflict() {
  let f = fixture().await;
  let err = f.store.add_subject(subject("MS", "Other")).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicateSubjectCode(_))));
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn member_sees_only_own_grades_whatever_the_filters() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 80.0).await;
  grade(&f, &f.bob, &f.math, 60.0).await;
  grade(&f, &f.bob, &f.physics, 70.0).await;

  for params in [
    vec![],
    vec![("user", "2")],
    vec![("user", "abc")],
    vec![("subject", "1"), ("min", "0")],
  ] {
    let grades = f
      .store
      .list_grades(&scoped(&f.alice, EntityKind::Grade, &params))
      .await
      .unwrap();
    assert!(
      grades.iter().all(|g| g.user_id == f.alice.user_id),
      "params {params:?} leaked {grades:?}"
    );
  }

  // Asking for bob's grades as alice narrows to nothing rather than widening.
  let bob_id = f.bob.user_id.to_string();
  let none = f
    .store
    .list_grades(&scoped(&f.alice, EntityKind::Grade, &[("user", bob_id.as_str())]))
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn staff_sees_every_row() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 80.0).await;
  grade(&f, &f.bob, &f.math, 60.0).await;
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  mark(&f, &f.bob, &f.math, day(2), AttendanceStatus::Absent).await;
  f.store.add_event(event(&f.alice, 1)).await.unwrap();
  f.store.add_event(event(&f.bob, 2)).await.unwrap();

  let grades = f
    .store
    .list_grades(&scoped(&f.teacher, EntityKind::Grade, &[]))
    .await
    .unwrap();
  assert_eq!(grades.len(), 2);

  let rows = f
    .store
    .list_attendance(&scoped(&f.teacher, EntityKind::Attendance, &[]))
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);

  let events = f
    .store
    .list_events(&scoped(&f.teacher, EntityKind::Event, &[]))
    .await
    .unwrap();
  assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn member_sees_only_own_events_and_attendance() {
  let f = fixture().await;
  f.store.add_event(event(&f.alice, 1)).await.unwrap();
  f.store.add_event(event(&f.bob, 2)).await.unwrap();
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  mark(&f, &f.bob, &f.math, day(2), AttendanceStatus::Late).await;

  let events = f
    .store
    .list_events(&scoped(&f.bob, EntityKind::Event, &[("owner", "abc")]))
    .await
    .unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].owner_id, f.bob.user_id);

  let rows = f
    .store
    .list_attendance(&scoped(&f.bob, EntityKind::Attendance, &[]))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].user_id, f.bob.user_id);
}

// ─── Filters and ordering ────────────────────────────────────────────────────

#[tokio::test]
async fn grade_range_filters_apply_newest_first() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 40.0).await;
  grade(&f, &f.alice, &f.math, 75.0).await;
  grade(&f, &f.alice, &f.physics, 95.0).await;

  let grades = f
    .store
    .list_grades(&scoped(&f.alice, EntityKind::Grade, &[("min", "50"), ("max", "100")]))
    .await
    .unwrap();
  assert_eq!(grades.len(), 2);
  assert!(grades.iter().all(|g| (50.0..=100.0).contains(&g.value)));
  assert!(grades.windows(2).all(|w| w[0].recorded_at >= w[1].recorded_at));
  assert!(grades.iter().any(|g| g.subject_name == "Physics"));
}

#[tokio::test]
async fn malformed_grade_bounds_do_not_fail_the_listing() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 40.0).await;
  let grades = f
    .store
    .list_grades(&scoped(&f.alice, EntityKind::Grade, &[("min", "high")]))
    .await
    .unwrap();
  assert_eq!(grades.len(), 1);
}

#[tokio::test]
async fn attendance_date_range_and_status() {
  let f = fixture().await;
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  mark(&f, &f.alice, &f.math, day(3), AttendanceStatus::Absent).await;
  mark(&f, &f.alice, &f.math, day(4), AttendanceStatus::Present).await;

  let rows = f
    .store
    .list_attendance(&scoped(
      &f.alice,
      EntityKind::Attendance,
      &[("start", "2024-09-03"), ("end", "2024-09-04")],
    ))
    .await
    .unwrap();
  let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
  assert_eq!(dates, [day(4), day(3)]);

  let present = f
    .store
    .list_attendance(&scoped(
      &f.alice,
      EntityKind::Attendance,
      &[("status", "PRESENT"), ("start", "not-a-date")],
    ))
    .await
    .unwrap();
  assert_eq!(present.len(), 2);
}

#[tokio::test]
async fn assignments_upcoming_and_overdue() {
  let f = fixture().await;
  let now = Utc::now();
  let make = |title: &str, due_in: i64, status| NewAssignment {
    subject_id: f.math.subject_id,
    title: title.into(),
    description: String::new(),
    due_at: now + Duration::days(due_in),
    status,
    created_by: Some(f.teacher.user_id),
  };
  f.store.add_assignment(make("late", -2, AssignmentStatus::Pending)).await.unwrap();
  f.store.add_assignment(make("next", 3, AssignmentStatus::Pending)).await.unwrap();
  f.store.add_assignment(make("soon", 1, AssignmentStatus::Pending)).await.unwrap();
  f.store.add_assignment(make("done", 1, AssignmentStatus::Done)).await.unwrap();

  let titles = |rows: Vec<satchel_core::coursework::Assignment>| {
    rows.into_iter().map(|a| a.title).collect::<Vec<_>>()
  };

  let upcoming = f
    .store
    .list_assignments(&scoped(&f.alice, EntityKind::Assignment, &[("upcoming", "true")]))
    .await
    .unwrap();
  assert_eq!(titles(upcoming), ["soon", "next"]);

  let overdue = f
    .store
    .list_assignments(&scoped(&f.alice, EntityKind::Assignment, &[("overdue", "1")]))
    .await
    .unwrap();
  assert_eq!(titles(overdue), ["late"]);

  let done = f
    .store
    .list_assignments(&scoped(&f.alice, EntityKind::Assignment, &[("status", "Done")]))
    .await
    .unwrap();
  assert_eq!(titles(done), ["done"]);
}

#[tokio::test]
async fn set_assignment_status_touches_updated_at() {
  let f = fixture().await;
  let a = f
    .store
    .add_assignment(NewAssignment {
      subject_id: f.math.subject_id,
      title: "Essay".into(),
      description: "On rivers".into(),
      due_at: Utc::now(),
      status: AssignmentStatus::Pending,
      created_by: None,
    })
    .await
    .unwrap();

  let later = a.updated_at + Duration::minutes(5);
  let updated = f
    .store
    .set_assignment_status(a.assignment_id, AssignmentStatus::Done, later)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.status, AssignmentStatus::Done);
  assert!(updated.updated_at > a.updated_at);

  let missing = f
    .store
    .set_assignment_status(9999, AssignmentStatus::Done, later)
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn events_order_by_start_and_filter_upcoming() {
  let f = fixture().await;
  f.store.add_event(event(&f.alice, 5)).await.unwrap();
  f.store.add_event(event(&f.alice, -5)).await.unwrap();
  f.store.add_event(event(&f.alice, 1)).await.unwrap();

  let all = f
    .store
    .list_events(&scoped(&f.alice, EntityKind::Event, &[]))
    .await
    .unwrap();
  assert!(all.windows(2).all(|w| w[0].starts_at <= w[1].starts_at));

  let upcoming = f
    .store
    .list_events(&scoped(&f.alice, EntityKind::Event, &[("upcoming", "yes")]))
    .await
    .unwrap();
  assert_eq!(upcoming.len(), 2);
}

#[tokio::test]
async fn ties_break_by_primary_key() {
  let f = fixture().await;
  let due_at = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();
  for title in ["first", "second", "third"] {
    f.store
      .add_assignment(NewAssignment {
        subject_id: f.math.subject_id,
        title: title.into(),
        description: String::new(),
        due_at,
        status: AssignmentStatus::Pending,
        created_by: None,
      })
      .await
      .unwrap();
  }
  let rows = f.store.list_assignments(&Predicate::all()).await.unwrap();
  let titles: Vec<_> = rows.iter().map(|a| a.title.as_str()).collect();
  assert_eq!(titles, ["first", "second", "third"]);
}

// ─── Invariants ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_attendance_is_a_conflict() {
  let f = fixture().await;
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  let err = f
    .store
    .record_attendance(NewAttendance {
      user_id: f.alice.user_id,
      subject_id: f.math.subject_id,
      date: day(2),
      status: AttendanceStatus::Late,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicateAttendance { .. })));

  // Same day in another subject is fine.
  mark(&f, &f.alice, &f.physics, day(2), AttendanceStatus::Late).await;
}

#[tokio::test]
async fn event_ending_before_start_is_never_stored() {
  let f = fixture().await;
  let mut bad = event(&f.alice, 1);
  bad.ends_at = bad.starts_at;

  let err = f.store.add_event(bad).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "ends_at", .. })
  ));
  let events = f.store.list_events(&Predicate::all()).await.unwrap();
  assert!(events.is_empty());
}

#[tokio::test]
async fn five_digit_years_are_rejected_and_listings_keep_working() {
  let f = fixture().await;
  let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

  let err = f
    .store
    .add_assignment(NewAssignment {
      subject_id: f.math.subject_id,
      title: "Someday".into(),
      description: String::new(),
      due_at: far,
      status: AssignmentStatus::Pending,
      created_by: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "due_at", .. })
  ));

  let mut ev = event(&f.alice, 1);
  ev.ends_at = far;
  let err = f.store.add_event(ev).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "ends_at", .. })
  ));

  let err = f
    .store
    .record_attendance(NewAttendance {
      user_id: f.alice.user_id,
      subject_id: f.math.subject_id,
      date: NaiveDate::from_ymd_opt(10000, 1, 1).unwrap(),
      status: AttendanceStatus::Present,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "date", .. })
  ));

  let overdue = f
    .store
    .list_assignments(&scoped(&f.alice, EntityKind::Assignment, &[("overdue", "true")]))
    .await
    .unwrap();
  assert!(overdue.is_empty());
  assert!(f.store.list_events(&Predicate::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_subject_is_a_validation_failure() {
  let f = fixture().await;
  let err = f
    .store
    .add_grade(NewGrade {
      user_id: f.alice.user_id,
      subject_id: 404,
      value: 50.0,
      weight: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::UnknownReference { field: "subject_id" })
  ));
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_subject_cascades_but_keeps_events() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 80.0).await;
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  let mut ev = event(&f.alice, 1);
  ev.subject_id = Some(f.math.subject_id);
  let ev = f.store.add_event(ev).await.unwrap();
  enrollment::enroll(
    &f.store,
    &Principal::from(&f.alice),
    None,
    f.math.subject_id,
    EnrollmentRole::Student,
  )
  .await
  .unwrap();

  assert!(f.store.delete_subject(f.math.subject_id).await.unwrap());

  assert!(f.store.list_grades(&Predicate::all()).await.unwrap().is_empty());
  assert!(f.store.list_attendance(&Predicate::all()).await.unwrap().is_empty());
  assert!(f.store.list_enrollments(&Predicate::all()).await.unwrap().is_empty());

  let events = f
    .store
    .list_events(&Predicate::all().with_id(ev.event_id))
    .await
    .unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].subject_id, None);
}

#[tokio::test]
async fn deleting_user_cascades_owned_rows() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 80.0).await;
  grade(&f, &f.bob, &f.math, 60.0).await;
  f.store.add_event(event(&f.alice, 1)).await.unwrap();

  assert!(f.store.delete_user(f.alice.user_id).await.unwrap());

  let grades = f.store.list_grades(&Predicate::all()).await.unwrap();
  assert_eq!(grades.len(), 1);
  assert_eq!(grades[0].user_id, f.bob.user_id);
  assert!(f.store.list_events(&Predicate::all()).await.unwrap().is_empty());
}

// ─── Enrollment guard ────────────────────────────────────────────────────────

#[tokio::test]
async fn second_enrollment_is_rejected_and_first_survives() {
  let f = fixture().await;
  let alice = Principal::from(&f.alice);
  let first = enrollment::enroll(
    &f.store,
    &alice,
    None,
    f.math.subject_id,
    EnrollmentRole::Student,
  )
  .await
  .unwrap();

  let err = enrollment::enroll(
    &f.store,
    &alice,
    None,
    f.math.subject_id,
    EnrollmentRole::Teacher,
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyEnrolled { .. })));

  let mine = f
    .store
    .list_enrollments(&scoped(&f.alice, EntityKind::Enrollment, &[]))
    .await
    .unwrap();
  assert_eq!(mine, vec![first]);
}

#[tokio::test]
async fn members_cannot_enroll_someone_else() {
  let f = fixture().await;
  let e = enrollment::enroll(
    &f.store,
    &Principal::from(&f.alice),
    Some(f.bob.user_id),
    f.physics.subject_id,
    EnrollmentRole::Student,
  )
  .await
  .unwrap();
  assert_eq!(e.user_id, f.alice.user_id);
}

#[tokio::test]
async fn withdraw_by_stranger_is_forbidden_and_row_stays() {
  let f = fixture().await;
  let e = enrollment::enroll(
    &f.store,
    &Principal::from(&f.alice),
    None,
    f.math.subject_id,
    EnrollmentRole::Student,
  )
  .await
  .unwrap();

  let outcome = enrollment::withdraw(&f.store, &Principal::from(&f.bob), e.enrollment_id)
    .await
    .unwrap();
  assert_eq!(outcome, Withdrawal::Forbidden);

  let still_there = f
    .store
    .list_enrollments(&Predicate::all().with_id(e.enrollment_id))
    .await
    .unwrap();
  assert_eq!(still_there.len(), 1);
}

#[tokio::test]
async fn withdraw_by_owner_or_staff_removes() {
  let f = fixture().await;
  let alice = Principal::from(&f.alice);
  let math = enrollment::enroll(&f.store, &alice, None, f.math.subject_id, EnrollmentRole::Student)
    .await
    .unwrap();
  let physics =
    enrollment::enroll(&f.store, &alice, None, f.physics.subject_id, EnrollmentRole::Student)
      .await
      .unwrap();

  let by_owner = enrollment::withdraw(&f.store, &alice, math.enrollment_id)
    .await
    .unwrap();
  assert_eq!(by_owner, Withdrawal::Removed(math));

  let by_staff =
    enrollment::withdraw(&f.store, &Principal::from(&f.teacher), physics.enrollment_id)
      .await
      .unwrap();
  assert!(matches!(by_staff, Withdrawal::Removed(_)));

  let gone = enrollment::withdraw(&f.store, &alice, 12345).await.unwrap();
  assert_eq!(gone, Withdrawal::NotFound);
}

// ─── Summaries over scoped rows ──────────────────────────────────────────────

#[tokio::test]
async fn grade_summary_over_scoped_rows() {
  let f = fixture().await;
  grade(&f, &f.alice, &f.math, 80.0).await;
  grade(&f, &f.alice, &f.math, 90.0).await;
  grade(&f, &f.bob, &f.math, 10.0).await;

  let grades = f
    .store
    .list_grades(&scoped(&f.alice, EntityKind::Grade, &[]))
    .await
    .unwrap();
  let s = summary::grade_summary(&grades);
  assert_eq!(s.count, 2);
  assert_eq!(s.avg, Some(85.0));
  assert_eq!(s.by_subject.len(), 1);
  assert_eq!(s.by_subject[0].subject, "Math");

  let none = f
    .store
    .list_grades(&scoped(&f.alice, EntityKind::Grade, &[("subject", "999")]))
    .await
    .unwrap();
  assert_eq!(summary::grade_summary(&none).avg, None);
}

#[tokio::test]
async fn attendance_summary_over_scoped_rows() {
  let f = fixture().await;
  mark(&f, &f.alice, &f.math, day(2), AttendanceStatus::Present).await;
  mark(&f, &f.alice, &f.math, day(3), AttendanceStatus::Present).await;
  mark(&f, &f.alice, &f.physics, day(3), AttendanceStatus::Absent).await;
  mark(&f, &f.alice, &f.physics, day(4), AttendanceStatus::Late).await;
  mark(&f, &f.bob, &f.math, day(2), AttendanceStatus::Absent).await;

  let rows = f
    .store
    .list_attendance(&scoped(&f.alice, EntityKind::Attendance, &[]))
    .await
    .unwrap();
  let s = summary::attendance_summary(&rows);
  assert_eq!(s.total, 4);
  assert_eq!(s.present_percent, 50.0);
  assert_eq!(s.counts.absent, 1);

  let by_name: BTreeMap<_, _> = s
    .by_subject
    .iter()
    .map(|e| (e.subject.as_str(), (e.present, e.total, e.percent)))
    .collect();
  assert_eq!(by_name["Math"], (2, 2, 100.0));
  assert_eq!(by_name["Physics"], (0, 2, 0.0));
}
