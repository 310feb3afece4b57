//! Helpers shared by the resource handlers: turning a caller and raw query
//! parameters into a scoped predicate, and looking up single rows through
//! the same scope.

use std::{collections::BTreeMap, str::FromStr};

use satchel_core::{
  RowId,
  kind::EntityKind,
  policy,
  predicate::Predicate,
  principal::Principal,
  query::{self, RequestContext},
};

use crate::error::ApiError;

/// The caller's visibility scope for `kind`, narrowed by the request filters.
pub fn listing(
  caller: &Principal,
  kind: EntityKind,
  params: BTreeMap<String, String>,
) -> Predicate {
  let ctx = RequestContext::from_params(params);
  query::build(policy::scope(caller, kind), kind, &ctx)
}

/// The caller's visibility scope for `kind`, narrowed to a single row.
pub fn single(caller: &Principal, kind: EntityKind, id: RowId) -> Predicate {
  policy::scope(caller, kind).with_id(id)
}

/// Parse an enum token from a request body, case-insensitively.
pub fn token<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ApiError> {
  raw
    .trim()
    .parse()
    .map_err(|_| ApiError::invalid(field, format!("{raw:?} is not a valid choice")))
}

pub fn not_found(kind: EntityKind, id: RowId) -> ApiError {
  ApiError::NotFound(format!("{} {id} not found", kind.as_ref()))
}
