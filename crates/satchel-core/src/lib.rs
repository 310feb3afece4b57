//! Core types and the scoped query engine for the Satchel records service.
//!
//! The crate has no HTTP or database dependencies. It owns
//! the rules that decide which rows a caller may see ([`policy`]), how raw
//! request filters narrow that set ([`query`]), and how scoped rows are
//! reduced into summaries ([`summary`]). Storage backends implement
//! [`store::RecordStore`].

pub mod attendance;
pub mod calendar;
pub mod coursework;
pub mod enrollment;
pub mod error;
pub mod event;
pub mod kind;
pub mod policy;
pub mod predicate;
pub mod principal;
pub mod query;
pub mod store;
pub mod subject;
pub mod summary;

pub use error::{Error, ErrorKind, Result};

/// Primary key of every persisted row.
pub type RowId = i64;

/// Opaque identity of a user, as supplied by the authentication provider.
pub type UserId = i64;
