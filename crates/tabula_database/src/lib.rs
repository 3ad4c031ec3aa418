//! Persistence for Tabula.
//!
//! Two repository traits cover everything the upload pipeline and the prompt
//! runner persist:
//!
//! - [`ImageRepository`]: image assets, unique per `(user, checksum)`
//! - [`ExecutionRepository`]: auditable prompt execution records
//!
//! [`InMemoryRepository`] implements both and is used when no database URL is
//! configured. With the `database` feature, [`PgRepository`] implements them over
//! PostgreSQL through a diesel r2d2 pool.
//!
//! Inserting an asset whose `(user, checksum)` already exists fails with
//! [`DatabaseErrorKind::UniqueViolation`] in both implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod repository;

#[cfg(feature = "database")]
mod models;
#[cfg(feature = "database")]
mod postgres;
#[cfg(feature = "database")]
pub mod schema;

pub use memory::InMemoryRepository;
pub use repository::{ExecutionRepository, ImageRepository};
pub use tabula_error::{DatabaseError, DatabaseErrorKind};

#[cfg(feature = "database")]
pub use models::{ExecutionRow, ImageAssetRow, NewExecutionRow, NewImageAssetRow};
#[cfg(feature = "database")]
pub use postgres::PgRepository;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
