//! Composable row predicates.
//!
//! A [`Predicate`] is a conjunction of [`Condition`]s. The only way to combine
//! predicates is [`Predicate::and`], so a predicate can be narrowed but never
//! widened once built. Backends translate conditions into their own query
//! language; the field names here are logical, not column names.

use chrono::{DateTime, NaiveDate, Utc};

use crate::RowId;

/// A logical field that a condition may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  /// Primary key of the row.
  Id,
  SubjectId,
  /// The user a grade, attendance row or enrollment belongs to.
  UserId,
  /// The user who owns an event.
  OwnerId,
  Status,
  /// Numeric grade value.
  Value,
  /// Calendar date of an attendance row.
  Date,
  DueAt,
  StartsAt,
  RecordedAt,
  Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Eq,
  Lt,
  Gte,
  Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Int(i64),
  Real(f64),
  /// Canonical token of an enum field (e.g. `"pending"`).
  Token(&'static str),
  Date(NaiveDate),
  Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
  pub field:   Field,
  pub cmp:     Comparison,
  pub operand: Operand,
}

impl Condition {
  pub fn new(field: Field, cmp: Comparison, operand: Operand) -> Self {
    Self { field, cmp, operand }
  }

  pub fn eq(field: Field, operand: Operand) -> Self {
    Self::new(field, Comparison::Eq, operand)
  }
}

/// A conjunction of conditions. The empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
  conditions: Vec<Condition>,
}

impl Predicate {
  /// The predicate that matches every row.
  pub fn all() -> Self { Self::default() }

  /// Narrow this predicate by one more condition.
  pub fn and(mut self, condition: Condition) -> Self {
    self.conditions.push(condition);
    self
  }

  /// Narrow this predicate to the single row with primary key `id`.
  pub fn with_id(self, id: RowId) -> Self {
    self.and(Condition::eq(Field::Id, Operand::Int(id)))
  }

  pub fn conditions(&self) -> &[Condition] { &self.conditions }

  pub fn is_all(&self) -> bool { self.conditions.is_empty() }
}

impl Extend<Condition> for Predicate {
  fn extend<I: IntoIterator<Item = Condition>>(&mut self, iter: I) {
    self.conditions.extend(iter);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn and_only_appends() {
    let base = Predicate::all().and(Condition::eq(Field::UserId, Operand::Int(3)));
    let narrowed = base.clone().with_id(9);
    assert_eq!(narrowed.conditions().len(), 2);
    assert_eq!(narrowed.conditions()[0], base.conditions()[0]);
  }

  #[test]
  fn empty_predicate_is_all() {
    assert!(Predicate::all().is_all());
    assert!(!Predicate::all().with_id(1).is_all());
  }
}
