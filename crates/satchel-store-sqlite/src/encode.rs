//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC with
//! microsecond precision, so lexical order equals chronological order and
//! range predicates can compare the text directly. Dates are `YYYY-MM-DD`.
//! Enum fields are stored as their lowercase token.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use satchel_core::{
  attendance::Attendance,
  coursework::{Assignment, Grade},
  enrollment::Enrollment,
  event::Event,
  predicate::Operand,
  principal::User,
  subject::Subject,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enum tokens ─────────────────────────────────────────────────────────────

pub fn decode_token<T: FromStr>(s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown token {s:?}")))
}

// ─── Predicate operands ──────────────────────────────────────────────────────

pub fn encode_operand(operand: &Operand) -> Value {
  match operand {
    Operand::Int(i) => Value::Integer(*i),
    Operand::Real(r) => Value::Real(*r),
    Operand::Token(t) => Value::Text((*t).to_owned()),
    Operand::Date(d) => Value::Text(encode_date(*d)),
    Operand::Timestamp(dt) => Value::Text(encode_dt(*dt)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:      i64,
  pub username:     String,
  pub is_staff:     bool,
  pub is_superuser: bool,
  pub created_at:   String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      self.user_id,
      username:     self.username,
      is_staff:     self.is_staff,
      is_superuser: self.is_superuser,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: i64,
  pub code:       String,
  pub name:       String,
  pub color:      Option<String>,
  pub created_at: String,
}

impl RawSubject {
  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: self.subject_id,
      code:       self.code,
      name:       self.name,
      color:      self.color,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAssignment {
  pub assignment_id: i64,
  pub subject_id:    i64,
  pub title:         String,
  pub description:   String,
  pub due_at:        String,
  pub status:        String,
  pub created_by:    Option<i64>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: self.assignment_id,
      subject_id:    self.subject_id,
      title:         self.title,
      description:   self.description,
      due_at:        decode_dt(&self.due_at)?,
      status:        decode_token(&self.status)?,
      created_by:    self.created_by,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A `grades` row joined with its subject's name.
pub struct RawGrade {
  pub grade_id:     i64,
  pub user_id:      i64,
  pub subject_id:   i64,
  pub subject_name: String,
  pub value:        f64,
  pub weight:       Option<f64>,
  pub recorded_at:  String,
}

impl RawGrade {
  pub fn into_grade(self) -> Result<Grade> {
    Ok(Grade {
      grade_id:     self.grade_id,
      user_id:      self.user_id,
      subject_id:   self.subject_id,
      subject_name: self.subject_name,
      value:        self.value,
      weight:       self.weight,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

/// An `attendance` row joined with its subject's name.
pub struct RawAttendance {
  pub attendance_id: i64,
  pub user_id:       i64,
  pub subject_id:    i64,
  pub subject_name:  String,
  pub date:          String,
  pub status:        String,
  pub created_at:    String,
}

impl RawAttendance {
  pub fn into_attendance(self) -> Result<Attendance> {
    Ok(Attendance {
      attendance_id: self.attendance_id,
      user_id:       self.user_id,
      subject_id:    self.subject_id,
      subject_name:  self.subject_name,
      date:          decode_date(&self.date)?,
      status:        decode_token(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawEvent {
  pub event_id:   i64,
  pub owner_id:   i64,
  pub subject_id: Option<i64>,
  pub title:      String,
  pub location:   Option<String>,
  pub starts_at:  String,
  pub ends_at:    String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:   self.event_id,
      owner_id:   self.owner_id,
      subject_id: self.subject_id,
      title:      self.title,
      location:   self.location,
      starts_at:  decode_dt(&self.starts_at)?,
      ends_at:    decode_dt(&self.ends_at)?,
    })
  }
}

pub struct RawEnrollment {
  pub enrollment_id: i64,
  pub user_id:       i64,
  pub subject_id:    i64,
  pub role:          String,
  pub created_at:    String,
}

impl RawEnrollment {
  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id: self.enrollment_id,
      user_id:       self.user_id,
      subject_id:    self.subject_id,
      role:          decode_token(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
