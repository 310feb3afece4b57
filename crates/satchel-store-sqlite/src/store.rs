//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, ffi};
use satchel_core::{
  RowId, UserId,
  attendance::{Attendance, NewAttendance},
  coursework::{Assignment, AssignmentStatus, Grade, NewAssignment, NewGrade},
  enrollment::{Enrollment, NewEnrollment},
  event::{Event, NewEvent},
  kind::EntityKind,
  predicate::Predicate,
  principal::User,
  store::RecordStore,
  subject::{NewSubject, Subject},
};

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawAttendance, RawEnrollment, RawEvent, RawGrade,
    RawSubject, RawUser, encode_date, encode_dt,
  },
  schema::SCHEMA,
  sql,
};

// ─── Insert outcomes ─────────────────────────────────────────────────────────

/// How an `INSERT` ended. Constraint violations are expected outcomes and are
/// turned into domain errors by the caller.
enum Insert {
  Row(i64),
  Duplicate,
  /// A foreign key pointed at a missing row; carries the offending field.
  MissingReference(&'static str),
}

fn constraint_code(e: &rusqlite::Error) -> Option<i32> {
  match e {
    rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
    _ => None,
  }
}

/// Classify the result of an `INSERT`. On a foreign-key failure, `blame` is
/// asked which referenced field is missing.
fn classify_insert(
  conn: &rusqlite::Connection,
  result: rusqlite::Result<usize>,
  blame: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<&'static str>,
) -> rusqlite::Result<Insert> {
  match result {
    Ok(_) => Ok(Insert::Row(conn.last_insert_rowid())),
    Err(e) => match constraint_code(&e) {
      Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => Ok(Insert::Duplicate),
      Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
        Ok(Insert::MissingReference(blame(conn)?))
      }
      _ => Err(e),
    },
  }
}

/// Which of a user/subject pair is missing, for rows that reference both.
fn missing_user_or_subject(
  conn: &rusqlite::Connection,
  user_id: UserId,
) -> rusqlite::Result<&'static str> {
  let user_exists = conn
    .query_row(
      "SELECT 1 FROM users WHERE user_id = ?1",
      rusqlite::params![user_id],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  Ok(if user_exists { "subject_id" } else { "user_id" })
}

impl Insert {
  fn into_id(self, duplicate: impl FnOnce() -> satchel_core::Error) -> Result<i64> {
    match self {
      Insert::Row(id) => Ok(id),
      Insert::Duplicate => Err(duplicate().into()),
      Insert::MissingReference(field) => {
        Err(satchel_core::Error::UnknownReference { field }.into())
      }
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Timestamps are stored with microsecond precision; values handed back from
/// an insert are truncated the same way so they match a later read.
fn stored(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

const SUBJECT_SELECT: &str =
  "SELECT t.subject_id, t.code, t.name, t.color, t.created_at FROM subjects t";

const ASSIGNMENT_SELECT: &str = "SELECT t.assignment_id, t.subject_id, t.title, \
   t.description, t.due_at, t.status, t.created_by, t.created_at, t.updated_at
   FROM assignments t";

const GRADE_SELECT: &str = "SELECT t.grade_id, t.user_id, t.subject_id, s.name, \
   t.value, t.weight, t.recorded_at
   FROM grades t JOIN subjects s ON s.subject_id = t.subject_id";

const ATTENDANCE_SELECT: &str = "SELECT t.attendance_id, t.user_id, \
   t.subject_id, s.name, t.date, t.status, t.created_at
   FROM attendance t JOIN subjects s ON s.subject_id = t.subject_id";

const EVENT_SELECT: &str = "SELECT t.event_id, t.owner_id, t.subject_id, \
   t.title, t.location, t.starts_at, t.ends_at FROM events t";

const ENROLLMENT_SELECT: &str = "SELECT t.enrollment_id, t.user_id, \
   t.subject_id, t.role, t.created_at FROM enrollments t";

/// A Satchel record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Run a scoped listing: `select` followed by the compiled predicate and
  /// the kind's ordering.
  async fn select<R, F>(
    &self,
    kind: EntityKind,
    select: &'static str,
    predicate: &Predicate,
    map: F,
  ) -> Result<Vec<R>>
  where
    R: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let compiled = sql::compile(kind, predicate)?;
    let query = format!(
      "{select} {} {}",
      compiled.where_clause,
      sql::order_by(kind)?
    );

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(compiled.params), |row| map(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Delete one row by primary key; `false` if nothing matched.
  async fn delete_row(
    &self,
    table: &'static str,
    pk: &'static str,
    id: RowId,
  ) -> Result<bool> {
    let sql = format!("DELETE FROM {table} WHERE {pk} = ?1");
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id])?))
      .await?;
    Ok(changed > 0)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(
    &self,
    username: String,
    is_staff: bool,
    is_superuser: bool,
  ) -> Result<User> {
    let at_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (username, is_staff, is_superuser, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (username) DO UPDATE SET
             is_staff     = excluded.is_staff,
             is_superuser = excluded.is_superuser",
          rusqlite::params![username, is_staff, is_superuser, at_str],
        )?;
        Ok(conn.query_row(
          "SELECT user_id, username, is_staff, is_superuser, created_at
           FROM users WHERE username = ?1",
          rusqlite::params![username],
          |row| {
            Ok(RawUser {
              user_id:      row.get(0)?,
              username:     row.get(1)?,
              is_staff:     row.get(2)?,
              is_superuser: row.get(3)?,
              created_at:   row.get(4)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn delete_user(&self, user_id: UserId) -> Result<bool> {
    self.delete_row("users", "user_id", user_id).await
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    input.validate()?;

    let created_at = stored(Utc::now());
    let code       = input.code.trim().to_owned();
    let code_c     = code.clone();
    let name_c     = input.name.clone();
    let color_c    = input.color.clone();
    let at_str     = encode_dt(created_at);

    let subject_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO subjects (code, name, color, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![code_c, name_c, color_c, at_str],
        );
        Ok(classify_insert(conn, result, |_| Ok("code"))?)
      })
      .await?
      .into_id(|| satchel_core::Error::DuplicateSubjectCode(code.clone()))?;

    Ok(Subject {
      subject_id,
      code,
      name: input.name,
      color: input.color,
      created_at,
    })
  }

  async fn list_subjects(&self, predicate: &Predicate) -> Result<Vec<Subject>> {
    let raws = self
      .select(EntityKind::Subject, SUBJECT_SELECT, predicate, |row| {
        Ok(RawSubject {
          subject_id: row.get(0)?,
          code:       row.get(1)?,
          name:       row.get(2)?,
          color:      row.get(3)?,
          created_at: row.get(4)?,
        })
      })
      .await?;
    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn delete_subject(&self, subject_id: RowId) -> Result<bool> {
    self.delete_row("subjects", "subject_id", subject_id).await
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn add_assignment(&self, input: NewAssignment) -> Result<Assignment> {
    input.validate()?;

    let now = stored(Utc::now());
    let subject_id   = input.subject_id;
    let title        = input.title.clone();
    let description  = input.description.clone();
    let due_str      = encode_dt(input.due_at);
    let status_str   = input.status.as_ref().to_owned();
    let created_by   = input.created_by;
    let at_str       = encode_dt(now);

    let assignment_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO assignments (
             subject_id, title, description, due_at, status,
             created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![
            subject_id,
            title,
            description,
            due_str,
            status_str,
            created_by,
            at_str,
          ],
        );
        Ok(classify_insert(conn, result, |conn| match created_by {
          Some(user_id) => missing_user_or_subject(conn, user_id),
          None => Ok("subject_id"),
        })?)
      })
      .await?
      .into_id(|| satchel_core::Error::validation("assignment_id", "already exists"))?;

    Ok(Assignment {
      assignment_id,
      subject_id: input.subject_id,
      title: input.title,
      description: input.description,
      due_at: stored(input.due_at),
      status: input.status,
      created_by: input.created_by,
      created_at: now,
      updated_at: now,
    })
  }

  async fn list_assignments(&self, predicate: &Predicate) -> Result<Vec<Assignment>> {
    let raws = self
      .select(EntityKind::Assignment, ASSIGNMENT_SELECT, predicate, |row| {
        Ok(RawAssignment {
          assignment_id: row.get(0)?,
          subject_id:    row.get(1)?,
          title:         row.get(2)?,
          description:   row.get(3)?,
          due_at:        row.get(4)?,
          status:        row.get(5)?,
          created_by:    row.get(6)?,
          created_at:    row.get(7)?,
          updated_at:    row.get(8)?,
        })
      })
      .await?;
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  async fn set_assignment_status(
    &self,
    assignment_id: RowId,
    status: AssignmentStatus,
    at: DateTime<Utc>,
  ) -> Result<Option<Assignment>> {
    let status_str = status.as_ref().to_owned();
    let at_str     = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE assignments SET status = ?1, updated_at = ?2
           WHERE assignment_id = ?3",
          rusqlite::params![status_str, at_str, assignment_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    let lookup = Predicate::all().with_id(assignment_id);
    Ok(self.list_assignments(&lookup).await?.into_iter().next())
  }

  async fn delete_assignment(&self, assignment_id: RowId) -> Result<bool> {
    self.delete_row("assignments", "assignment_id", assignment_id).await
  }

  // ── Grades ────────────────────────────────────────────────────────────────

  async fn add_grade(&self, input: NewGrade) -> Result<Grade> {
    input.validate()?;

    let NewGrade { user_id, subject_id, value, weight } = input;
    let at_str = encode_dt(Utc::now());

    let grade_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO grades (user_id, subject_id, value, weight, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![user_id, subject_id, value, weight, at_str],
        );
        Ok(classify_insert(conn, result, |conn| {
          missing_user_or_subject(conn, user_id)
        })?)
      })
      .await?
      .into_id(|| satchel_core::Error::validation("grade_id", "already exists"))?;

    let lookup = Predicate::all().with_id(grade_id);
    self
      .list_grades(&lookup)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| Error::Decode(format!("grade {grade_id} vanished after insert")))
  }

  async fn list_grades(&self, predicate: &Predicate) -> Result<Vec<Grade>> {
    let raws = self
      .select(EntityKind::Grade, GRADE_SELECT, predicate, |row| {
        Ok(RawGrade {
          grade_id:     row.get(0)?,
          user_id:      row.get(1)?,
          subject_id:   row.get(2)?,
          subject_name: row.get(3)?,
          value:        row.get(4)?,
          weight:       row.get(5)?,
          recorded_at:  row.get(6)?,
        })
      })
      .await?;
    raws.into_iter().map(RawGrade::into_grade).collect()
  }

  async fn delete_grade(&self, grade_id: RowId) -> Result<bool> {
    self.delete_row("grades", "grade_id", grade_id).await
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn record_attendance(&self, input: NewAttendance) -> Result<Attendance> {
    input.validate()?;

    let NewAttendance { user_id, subject_id, date, status } = input;
    let date_str   = encode_date(date);
    let status_str = status.as_ref().to_owned();
    let at_str     = encode_dt(Utc::now());

    let attendance_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO attendance (user_id, subject_id, date, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![user_id, subject_id, date_str, status_str, at_str],
        );
        Ok(classify_insert(conn, result, |conn| {
          missing_user_or_subject(conn, user_id)
        })?)
      })
      .await?
      .into_id(|| satchel_core::Error::DuplicateAttendance {
        user_id,
        subject_id,
        date,
      })?;

    let lookup = Predicate::all().with_id(attendance_id);
    self
      .list_attendance(&lookup)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| {
        Error::Decode(format!("attendance {attendance_id} vanished after insert"))
      })
  }

  async fn list_attendance(&self, predicate: &Predicate) -> Result<Vec<Attendance>> {
    let raws = self
      .select(EntityKind::Attendance, ATTENDANCE_SELECT, predicate, |row| {
        Ok(RawAttendance {
          attendance_id: row.get(0)?,
          user_id:       row.get(1)?,
          subject_id:    row.get(2)?,
          subject_name:  row.get(3)?,
          date:          row.get(4)?,
          status:        row.get(5)?,
          created_at:    row.get(6)?,
        })
      })
      .await?;
    raws.into_iter().map(RawAttendance::into_attendance).collect()
  }

  async fn delete_attendance(&self, attendance_id: RowId) -> Result<bool> {
    self.delete_row("attendance", "attendance_id", attendance_id).await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn add_event(&self, input: NewEvent) -> Result<Event> {
    // Rejected here, before anything reaches the database.
    input.validate()?;

    let owner_id   = input.owner_id;
    let subject_id = input.subject_id;
    let title      = input.title.clone();
    let location   = input.location.clone();
    let starts_str = encode_dt(input.starts_at);
    let ends_str   = encode_dt(input.ends_at);

    let event_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO events (owner_id, subject_id, title, location, starts_at, ends_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![owner_id, subject_id, title, location, starts_str, ends_str],
        );
        Ok(classify_insert(conn, result, |conn| {
          missing_user_or_subject(conn, owner_id).map(|field| match field {
            "user_id" => "owner_id",
            other => other,
          })
        })?)
      })
      .await?
      .into_id(|| satchel_core::Error::validation("event_id", "already exists"))?;

    Ok(Event {
      event_id,
      owner_id: input.owner_id,
      subject_id: input.subject_id,
      title: input.title,
      location: input.location,
      starts_at: stored(input.starts_at),
      ends_at: stored(input.ends_at),
    })
  }

  async fn list_events(&self, predicate: &Predicate) -> Result<Vec<Event>> {
    let raws = self
      .select(EntityKind::Event, EVENT_SELECT, predicate, |row| {
        Ok(RawEvent {
          event_id:   row.get(0)?,
          owner_id:   row.get(1)?,
          subject_id: row.get(2)?,
          title:      row.get(3)?,
          location:   row.get(4)?,
          starts_at:  row.get(5)?,
          ends_at:    row.get(6)?,
        })
      })
      .await?;
    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn delete_event(&self, event_id: RowId) -> Result<bool> {
    self.delete_row("events", "event_id", event_id).await
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn add_enrollment(&self, input: NewEnrollment) -> Result<Enrollment> {
    let NewEnrollment { user_id, subject_id, role } = input;
    let created_at = stored(Utc::now());
    let role_str   = role.as_ref().to_owned();
    let at_str     = encode_dt(created_at);

    let enrollment_id = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO enrollments (user_id, subject_id, role, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, subject_id, role_str, at_str],
        );
        Ok(classify_insert(conn, result, |conn| {
          missing_user_or_subject(conn, user_id)
        })?)
      })
      .await?
      .into_id(|| satchel_core::Error::AlreadyEnrolled { user_id, subject_id })?;

    Ok(Enrollment { enrollment_id, user_id, subject_id, role, created_at })
  }

  async fn list_enrollments(&self, predicate: &Predicate) -> Result<Vec<Enrollment>> {
    let raws = self
      .select(EntityKind::Enrollment, ENROLLMENT_SELECT, predicate, |row| {
        Ok(RawEnrollment {
          enrollment_id: row.get(0)?,
          user_id:       row.get(1)?,
          subject_id:    row.get(2)?,
          role:          row.get(3)?,
          created_at:    row.get(4)?,
        })
      })
      .await?;
    raws.into_iter().map(RawEnrollment::into_enrollment).collect()
  }

  async fn delete_enrollment(&self, enrollment_id: RowId) -> Result<bool> {
    self.delete_row("enrollments", "enrollment_id", enrollment_id).await
  }
}
