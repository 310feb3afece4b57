//! The authenticated caller and the user rows that back it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Capability tag derived from a principal. Visibility and mutation rights are
/// decided from this tag alone, never from the principal's other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Staff or superuser: sees and may modify every row.
  Staff,
  /// Anyone else: sees public rows and the rows they own.
  Member,
}

/// The authenticated actor making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id:      UserId,
  pub is_staff:     bool,
  pub is_superuser: bool,
}

impl Principal {
  pub fn member(user_id: UserId) -> Self {
    Self { user_id, is_staff: false, is_superuser: false }
  }

  pub fn staff(user_id: UserId) -> Self {
    Self { user_id, is_staff: true, is_superuser: false }
  }

  pub fn role(&self) -> Role {
    if self.is_staff || self.is_superuser {
      Role::Staff
    } else {
      Role::Member
    }
  }
}

/// A user row. Every user reference in the store points at one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      UserId,
  pub username:     String,
  pub is_staff:     bool,
  pub is_superuser: bool,
  pub created_at:   DateTime<Utc>,
}

impl From<&User> for Principal {
  fn from(user: &User) -> Self {
    Self {
      user_id:      user.user_id,
      is_staff:     user.is_staff,
      is_superuser: user.is_superuser,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn superuser_without_staff_flag_is_staff() {
    let p = Principal { user_id: 1, is_staff: false, is_superuser: true };
    assert_eq!(p.role(), Role::Staff);
  }

  #[test]
  fn plain_user_is_member() {
    assert_eq!(Principal::member(7).role(), Role::Member);
  }
}
