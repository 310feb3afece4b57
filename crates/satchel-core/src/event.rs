//! Calendar events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, RowId, UserId, calendar};

/// A calendar entry owned by one user. `subject_id` is `None` for general
/// events, and becomes `None` when the subject is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:   RowId,
  pub owner_id:   UserId,
  pub subject_id: Option<RowId>,
  pub title:      String,
  pub location:   Option<String>,
  pub starts_at:  DateTime<Utc>,
  pub ends_at:    DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub owner_id:   UserId,
  pub subject_id: Option<RowId>,
  pub title:      String,
  pub location:   Option<String>,
  pub starts_at:  DateTime<Utc>,
  pub ends_at:    DateTime<Utc>,
}

impl NewEvent {
  /// Checked before anything is written; an event must end strictly after it
  /// starts.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::validation("title", "must not be empty"));
    }
    calendar::check_year("starts_at", &self.starts_at)?;
    calendar::check_year("ends_at", &self.ends_at)?;
    if self.ends_at <= self.starts_at {
      return Err(Error::validation("ends_at", "must be after starts_at"));
    }
    Ok(())
  }
}
