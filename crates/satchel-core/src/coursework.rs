//! Assignments and grades: the per-subject coursework records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

use crate::{Error, Result, RowId, UserId, calendar};

// ─── Assignment ──────────────────────────────────────────────────────────────

/// Completion state of an assignment. Parsed case-insensitively; the
/// lowercase form is the canonical stored token.
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssignmentStatus {
  #[default]
  Pending,
  Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: RowId,
  pub subject_id:    RowId,
  pub title:         String,
  pub description:   String,
  pub due_at:        DateTime<Utc>,
  pub status:        AssignmentStatus,
  /// The user who created the assignment, if still present.
  pub created_by:    Option<UserId>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_assignment`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub subject_id:  RowId,
  pub title:       String,
  pub description: String,
  pub due_at:      DateTime<Utc>,
  pub status:      AssignmentStatus,
  pub created_by:  Option<UserId>,
}

impl NewAssignment {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::validation("title", "must not be empty"));
    }
    calendar::check_year("due_at", &self.due_at)
  }
}

// ─── Grade ───────────────────────────────────────────────────────────────────

/// A single grade a user received in a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
  pub grade_id:     RowId,
  pub user_id:      UserId,
  pub subject_id:   RowId,
  /// Resolved from the subject at read time; not stored on the grade.
  pub subject_name: String,
  pub value:        f64,
  /// Credit weight, when the grade counts for more than one unit.
  pub weight:       Option<f64>,
  pub recorded_at:  DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_grade`].
/// `recorded_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewGrade {
  pub user_id:    UserId,
  pub subject_id: RowId,
  pub value:      f64,
  pub weight:     Option<f64>,
}

impl NewGrade {
  pub fn validate(&self) -> Result<()> {
    if !self.value.is_finite() {
      return Err(Error::validation("value", "must be a finite number"));
    }
    if let Some(weight) = self.weight
      && !(weight.is_finite() && weight > 0.0)
    {
      return Err(Error::validation("weight", "must be a positive number"));
    }
    Ok(())
  }
}
