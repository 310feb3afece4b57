//! Attendance records, one row per user, subject and calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

use crate::{Result, RowId, UserId, calendar};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
  Present,
  Absent,
  Late,
  Excused,
}

/// At most one row exists per `(user_id, subject_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
  pub attendance_id: RowId,
  pub user_id:       UserId,
  pub subject_id:    RowId,
  /// Resolved from the subject at read time; not stored on the row.
  pub subject_name:  String,
  pub date:          NaiveDate,
  pub status:        AttendanceStatus,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::record_attendance`].
#[derive(Debug, Clone)]
pub struct NewAttendance {
  pub user_id:    UserId,
  pub subject_id: RowId,
  pub date:       NaiveDate,
  pub status:     AttendanceStatus,
}

impl NewAttendance {
  pub fn validate(&self) -> Result<()> { calendar::check_year("date", &self.date) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_parses_any_case() {
    assert_eq!("LATE".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Late);
    assert!("asleep".parse::<AttendanceStatus>().is_err());
  }

  #[test]
  fn five_digit_year_is_rejected() {
    let row = NewAttendance {
      user_id:    1,
      subject_id: 1,
      date:       NaiveDate::from_ymd_opt(10000, 1, 1).unwrap(),
      status:     AttendanceStatus::Present,
    };
    assert_eq!(row.validate().unwrap_err().field(), "date");
  }
}
