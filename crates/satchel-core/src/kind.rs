//! Entity kinds and their per-kind metadata.

use serde::Serialize;
use strum::{AsRefStr, IntoStaticStr};

use crate::predicate::Field;

/// The closed set of record kinds held by the store.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
  Subject,
  Assignment,
  Grade,
  Attendance,
  Event,
  Enrollment,
}

/// Listing order for a kind. Ties are always broken by primary key ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
  pub field:      Field,
  pub descending: bool,
}

impl EntityKind {
  /// The field holding the user a row belongs to, if rows of this kind are
  /// owned at all.
  pub fn owner_field(self) -> Option<Field> {
    match self {
      Self::Grade | Self::Attendance | Self::Enrollment => Some(Field::UserId),
      Self::Event => Some(Field::OwnerId),
      Self::Subject | Self::Assignment => None,
    }
  }

  pub fn sort_order(self) -> SortOrder {
    let (field, descending) = match self {
      Self::Subject => (Field::Name, false),
      Self::Assignment => (Field::DueAt, false),
      Self::Grade => (Field::RecordedAt, true),
      Self::Attendance => (Field::Date, true),
      Self::Event => (Field::StartsAt, false),
      Self::Enrollment => (Field::Id, false),
    };
    SortOrder { field, descending }
  }
}
