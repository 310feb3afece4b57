//! Compiles raw request filters into a [`Predicate`].
//!
//! Each entity kind has a declarative table of recognised filter parameters.
//! [`build`] walks the table, parses each parameter that is present, and
//! appends the resulting conditions to the caller's scoped base predicate.
//!
//! Building never fails. A parameter that is missing, empty, or cannot be
//! parsed (a non-numeric id, an unknown status, a malformed date) is treated
//! exactly as if it had not been sent.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  attendance::AttendanceStatus,
  coursework::AssignmentStatus,
  kind::EntityKind,
  predicate::{Comparison, Condition, Field, Operand, Predicate},
};

// ─── Request context ─────────────────────────────────────────────────────────

/// The immutable inputs of one request: its raw query parameters and the
/// instant that "now" refers to for time-relative filters.
#[derive(Debug, Clone)]
pub struct RequestContext {
  params: BTreeMap<String, String>,
  now:    DateTime<Utc>,
}

impl RequestContext {
  pub fn new(params: BTreeMap<String, String>, now: DateTime<Utc>) -> Self {
    Self { params, now }
  }

  /// A context with the given parameters, evaluated at the current instant.
  pub fn from_params(params: BTreeMap<String, String>) -> Self {
    Self::new(params, Utc::now())
  }

  /// The trimmed value of `name`, or `None` if absent or blank.
  pub fn param(&self, name: &str) -> Option<&str> {
    self
      .params
      .get(name)
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
  }

  pub fn now(&self) -> DateTime<Utc> { self.now }
}

// ─── Filter table ────────────────────────────────────────────────────────────

/// How a raw parameter value is turned into an operand.
#[derive(Debug, Clone, Copy)]
enum Parse {
  /// A numeric row id.
  Id,
  /// A finite floating-point number.
  Real,
  /// A `YYYY-MM-DD` calendar date.
  Date,
  AssignmentStatus,
  AttendanceStatus,
}

#[derive(Debug, Clone, Copy)]
enum Filter {
  /// `field <cmp> parse(value)`.
  Compare {
    param: &'static str,
    field: Field,
    cmp:   Comparison,
    parse: Parse,
  },
  /// A boolean switch that expands to conditions relative to "now" when set.
  Flag {
    param:  &'static str,
    expand: fn(DateTime<Utc>) -> Vec<Condition>,
  },
}

const fn compare(
  param: &'static str,
  field: Field,
  cmp: Comparison,
  parse: Parse,
) -> Filter {
  Filter::Compare { param, field, cmp, parse }
}

const fn eq(param: &'static str, field: Field, parse: Parse) -> Filter {
  compare(param, field, Comparison::Eq, parse)
}

const ASSIGNMENT_FILTERS: &[Filter] = &[
  eq("subject", Field::SubjectId, Parse::Id),
  eq("status", Field::Status, Parse::AssignmentStatus),
  Filter::Flag { param: "upcoming", expand: pending_due_from },
  Filter::Flag { param: "overdue", expand: pending_due_before },
];

const GRADE_FILTERS: &[Filter] = &[
  eq("subject", Field::SubjectId, Parse::Id),
  eq("user", Field::UserId, Parse::Id),
  compare("min", Field::Value, Comparison::Gte, Parse::Real),
  compare("max", Field::Value, Comparison::Lte, Parse::Real),
];

const ATTENDANCE_FILTERS: &[Filter] = &[
  eq("user", Field::UserId, Parse::Id),
  eq("subject", Field::SubjectId, Parse::Id),
  eq("status", Field::Status, Parse::AttendanceStatus),
  compare("start", Field::Date, Comparison::Gte, Parse::Date),
  compare("end", Field::Date, Comparison::Lte, Parse::Date),
];

const EVENT_FILTERS: &[Filter] = &[
  eq("owner", Field::OwnerId, Parse::Id),
  eq("subject", Field::SubjectId, Parse::Id),
  Filter::Flag { param: "upcoming", expand: starting_from },
];

const ENROLLMENT_FILTERS: &[Filter] = &[
  eq("user", Field::UserId, Parse::Id),
  eq("subject", Field::SubjectId, Parse::Id),
];

fn filters(kind: EntityKind) -> &'static [Filter] {
  match kind {
    EntityKind::Subject => &[],
    EntityKind::Assignment => ASSIGNMENT_FILTERS,
    EntityKind::Grade => GRADE_FILTERS,
    EntityKind::Attendance => ATTENDANCE_FILTERS,
    EntityKind::Event => EVENT_FILTERS,
    EntityKind::Enrollment => ENROLLMENT_FILTERS,
  }
}

fn pending() -> Condition {
  Condition::eq(Field::Status, Operand::Token(AssignmentStatus::Pending.into()))
}

fn pending_due_from(now: DateTime<Utc>) -> Vec<Condition> {
  vec![
    pending(),
    Condition::new(Field::DueAt, Comparison::Gte, Operand::Timestamp(now)),
  ]
}

fn pending_due_before(now: DateTime<Utc>) -> Vec<Condition> {
  vec![
    pending(),
    Condition::new(Field::DueAt, Comparison::Lt, Operand::Timestamp(now)),
  ]
}

fn starting_from(now: DateTime<Utc>) -> Vec<Condition> {
  vec![Condition::new(
    Field::StartsAt,
    Comparison::Gte,
    Operand::Timestamp(now),
  )]
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

fn parse_operand(parse: Parse, raw: &str) -> Option<Operand> {
  match parse {
    Parse::Id => raw.parse::<i64>().ok().map(Operand::Int),
    Parse::Real => raw
      .parse::<f64>()
      .ok()
      .filter(|v| v.is_finite())
      .map(Operand::Real),
    Parse::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
      .ok()
      .map(Operand::Date),
    Parse::AssignmentStatus => raw
      .parse::<AssignmentStatus>()
      .ok()
      .map(|s| Operand::Token(s.into())),
    Parse::AttendanceStatus => raw
      .parse::<AttendanceStatus>()
      .ok()
      .map(|s| Operand::Token(s.into())),
  }
}

/// Whether a flag parameter is switched on.
pub fn is_truthy(raw: &str) -> bool {
  ["true", "1", "yes", "on"]
    .iter()
    .any(|t| raw.eq_ignore_ascii_case(t))
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Narrow `base` by every recognised, well-formed filter in `ctx` for `kind`.
///
/// `base` is expected to come from [`crate::policy::scope`]; its conditions
/// are kept first and untouched.
pub fn build(
  base: Predicate,
  kind: EntityKind,
  ctx: &RequestContext,
) -> Predicate {
  let mut predicate = base;
  for filter in filters(kind) {
    match *filter {
      Filter::Compare { param, field, cmp, parse } => {
        if let Some(operand) =
          ctx.param(param).and_then(|raw| parse_operand(parse, raw))
        {
          predicate = predicate.and(Condition::new(field, cmp, operand));
        }
      }
      Filter::Flag { param, expand } => {
        if ctx.param(param).is_some_and(is_truthy) {
          predicate.extend(expand(ctx.now()));
        }
      }
    }
  }
  predicate
}
