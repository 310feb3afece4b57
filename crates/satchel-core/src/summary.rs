//! Summaries over an already-scoped record set.
//!
//! Both reducers make a single pass over their input and never consult the
//! visibility policy; callers hand them exactly the rows the principal may
//! see. An empty input yields the empty summary shape, never an error.
//!
//! Averages and percentages are rounded to two decimals with
//! [`round2`], which rounds half away from zero.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
  attendance::{Attendance, AttendanceStatus},
  coursework::Grade,
};

/// Round to two decimal places, halves away from zero.
pub fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

/// `100 * part / total` rounded to two decimals; `0.0` when `total` is zero.
pub fn percent(part: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  round2(100.0 * part as f64 / total as f64)
}

/// Groups rows by subject name, remembering the order names first appear in.
struct Grouped<T> {
  index:  HashMap<String, usize>,
  groups: Vec<(String, T)>,
}

impl<T: Default> Grouped<T> {
  fn new() -> Self { Self { index: HashMap::new(), groups: Vec::new() } }

  fn entry(&mut self, name: &str) -> &mut T {
    let slot = match self.index.get(name) {
      Some(&i) => i,
      None => {
        self.index.insert(name.to_owned(), self.groups.len());
        self.groups.push((name.to_owned(), T::default()));
        self.groups.len() - 1
      }
    };
    &mut self.groups[slot].1
  }

  fn into_groups(self) -> impl Iterator<Item = (String, T)> {
    self.groups.into_iter()
  }
}

// ─── Grades ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
  pub count:      usize,
  /// `None` when there are no grades.
  pub avg:        Option<f64>,
  /// One entry per subject, in the order subjects first appear in the input.
  pub by_subject: Vec<SubjectAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
  pub subject: String,
  pub avg:     f64,
  pub count:   usize,
}

#[derive(Default)]
struct Tally {
  sum:   f64,
  count: usize,
}

/// Mean grade overall and per subject. Credit weights are not applied.
pub fn grade_summary(grades: &[Grade]) -> GradeSummary {
  let mut total = Tally::default();
  let mut by_subject = Grouped::<Tally>::new();

  for grade in grades {
    total.sum += grade.value;
    total.count += 1;
    let entry = by_subject.entry(&grade.subject_name);
    entry.sum += grade.value;
    entry.count += 1;
  }

  if total.count == 0 {
    return GradeSummary { count: 0, avg: None, by_subject: Vec::new() };
  }

  GradeSummary {
    count:      total.count,
    avg:        Some(round2(total.sum / total.count as f64)),
    by_subject: by_subject
      .into_groups()
      .map(|(subject, t)| SubjectAverage {
        subject,
        avg: round2(t.sum / t.count as f64),
        count: t.count,
      })
      .collect(),
  }
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// Tally of every status. All four keys are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCounts {
  pub present: usize,
  pub absent:  usize,
  pub late:    usize,
  pub excused: usize,
}

impl StatusCounts {
  fn add(&mut self, status: AttendanceStatus) {
    match status {
      AttendanceStatus::Present => self.present += 1,
      AttendanceStatus::Absent => self.absent += 1,
      AttendanceStatus::Late => self.late += 1,
      AttendanceStatus::Excused => self.excused += 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
  pub total:           usize,
  pub counts:          StatusCounts,
  /// Share of rows marked present; `0.0` for an empty set.
  pub present_percent: f64,
  pub by_subject:      Vec<SubjectAttendance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAttendance {
  pub subject: String,
  pub present: usize,
  pub total:   usize,
  pub percent: f64,
}

#[derive(Default)]
struct Presence {
  present: usize,
  total:   usize,
}

pub fn attendance_summary(rows: &[Attendance]) -> AttendanceSummary {
  let mut counts = StatusCounts::default();
  let mut by_subject = Grouped::<Presence>::new();

  for row in rows {
    counts.add(row.status);
    let entry = by_subject.entry(&row.subject_name);
    entry.total += 1;
    if row.status == AttendanceStatus::Present {
      entry.present += 1;
    }
  }

  AttendanceSummary {
    total: rows.len(),
    counts,
    present_percent: percent(counts.present, rows.len()),
    by_subject: by_subject
      .into_groups()
      .map(|(subject, p)| SubjectAttendance {
        subject,
        present: p.present,
        total: p.total,
        percent: percent(p.present, p.total),
      })
      .collect(),
  }
}
