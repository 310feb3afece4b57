//! Translation of core [`Predicate`]s into SQL `WHERE` / `ORDER BY` clauses.
//!
//! Every listing query aliases its main table as `t`, so conditions are
//! emitted as `t.<column> <op> ?N` with positional parameters.

use rusqlite::types::Value;
use satchel_core::{
  kind::EntityKind,
  predicate::{Comparison, Field, Predicate},
};

use crate::{Error, Result, encode::encode_operand};

/// A compiled `WHERE` clause (empty when the predicate matches everything)
/// and its bound parameters, in order.
#[derive(Debug)]
pub struct Compiled {
  pub where_clause: String,
  pub params:       Vec<Value>,
}

fn primary_key(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Subject => "subject_id",
    EntityKind::Assignment => "assignment_id",
    EntityKind::Grade => "grade_id",
    EntityKind::Attendance => "attendance_id",
    EntityKind::Event => "event_id",
    EntityKind::Enrollment => "enrollment_id",
  }
}

/// The column backing `field` on the table for `kind`.
fn column(kind: EntityKind, field: Field) -> Result<&'static str> {
  use EntityKind as K;

  let col = match (field, kind) {
    (Field::Id, _) => Some(primary_key(kind)),
    (Field::SubjectId, _) => Some("subject_id"),
    (Field::UserId, K::Grade | K::Attendance | K::Enrollment) => Some("user_id"),
    (Field::OwnerId, K::Event) => Some("owner_id"),
    (Field::Status, K::Assignment | K::Attendance) => Some("status"),
    (Field::Value, K::Grade) => Some("value"),
    (Field::Date, K::Attendance) => Some("date"),
    (Field::DueAt, K::Assignment) => Some("due_at"),
    (Field::StartsAt, K::Event) => Some("starts_at"),
    (Field::RecordedAt, K::Grade) => Some("recorded_at"),
    (Field::Name, K::Subject) => Some("name"),
    _ => None,
  };
  col.ok_or(Error::UnsupportedField { kind, field })
}

fn operator(cmp: Comparison) -> &'static str {
  match cmp {
    Comparison::Eq => "=",
    Comparison::Lt => "<",
    Comparison::Gte => ">=",
    Comparison::Lte => "<=",
  }
}

pub fn compile(kind: EntityKind, predicate: &Predicate) -> Result<Compiled> {
  let mut clauses = Vec::with_capacity(predicate.conditions().len());
  let mut params = Vec::with_capacity(predicate.conditions().len());

  for (i, cond) in predicate.conditions().iter().enumerate() {
    let col = column(kind, cond.field)?;
    clauses.push(format!("t.{col} {} ?{}", operator(cond.cmp), i + 1));
    params.push(encode_operand(&cond.operand));
  }

  let where_clause = if clauses.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", clauses.join(" AND "))
  };

  Ok(Compiled { where_clause, params })
}

/// `ORDER BY` for `kind`, tie-broken by primary key ascending.
pub fn order_by(kind: EntityKind) -> Result<String> {
  let order = kind.sort_order();
  let col = column(kind, order.field)?;
  let dir = if order.descending { "DESC" } else { "ASC" };
  Ok(format!("ORDER BY t.{col} {dir}, t.{} ASC", primary_key(kind)))
}
