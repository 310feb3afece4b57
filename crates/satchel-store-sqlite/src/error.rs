//! Error type for `satchel-store-sqlite`.

use satchel_core::{kind::EntityKind, predicate::Field, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure: validation or a uniqueness conflict.
  #[error(transparent)]
  Core(#[from] satchel_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected column value: {0}")]
  Decode(String),

  #[error("{kind:?} rows have no {field:?} column")]
  UnsupportedField { kind: EntityKind, field: Field },
}

impl StoreError for Error {
  fn domain(&self) -> Option<&satchel_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
