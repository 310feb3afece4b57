//! Subjects, the courses every other record hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, RowId};

pub const MAX_CODE_LEN: usize = 10;
pub const MAX_NAME_LEN: usize = 100;

/// A subject, e.g. `MS` / `Mathematics`. The code is unique and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: RowId,
  pub code:       String,
  pub name:       String,
  /// Display colour as `#rrggbb`.
  pub color:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub code:  String,
  pub name:  String,
  #[serde(default)]
  pub color: Option<String>,
}

impl NewSubject {
  pub fn validate(&self) -> Result<()> {
    let code = self.code.trim();
    if code.is_empty() {
      return Err(Error::validation("code", "must not be empty"));
    }
    if code.chars().count() > MAX_CODE_LEN {
      return Err(Error::validation(
        "code",
        format!("must be at most {MAX_CODE_LEN} characters"),
      ));
    }
    if self.name.trim().is_empty() {
      return Err(Error::validation("name", "must not be empty"));
    }
    if self.name.chars().count() > MAX_NAME_LEN {
      return Err(Error::validation(
        "name",
        format!("must be at most {MAX_NAME_LEN} characters"),
      ));
    }
    if let Some(color) = &self.color
      && !is_hex_color(color)
    {
      return Err(Error::validation("color", "must look like #rrggbb"));
    }
    Ok(())
  }
}

fn is_hex_color(s: &str) -> bool {
  s.len() == 7
    && s.starts_with('#')
    && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
