//! `pgmigrate` applies an ordered set of versioned SQL script files to
//! a PostgreSQL database exactly once each, tracking which have already
//! run.
//!
//! Core concepts:
//! - Migrations are plain `.sql` files named `<version>_<description>.sql`,
//!   discovered from a [`Source`] directory and applied in ascending
//!   version order.
//! - Applied migrations are recorded by name in a `migrations` table;
//!   a migration is pending iff no record with its name exists.
//! - Concurrent runs from independent processes are serialized with a
//!   session-scoped Postgres advisory lock; the loser fails fast with
//!   "could not acquire lock" instead of applying anything twice.
//! - Scripts are split into statements by a small lexer that respects
//!   single-quoted literals and `$$`-quoted blocks, so plpgsql bodies
//!   survive intact.
//!
//! Migrations are not wrapped in implicit transactions: a failing
//! multi-statement migration can leave earlier statements committed
//! with no applied record. Scripts that need atomicity should carry
//! their own `begin;` / `commit;`.
//!
//! # Example
//!
//! ```no_run
//! use pgmigrate::{up, PgStore, Source};
//!
//! # fn main() -> Result<(), pgmigrate::Error> {
//! let source = Source::new("./migrations")?;
//! let migrations = source.find_migrations()?;
//! let mut store = PgStore::connect("postgres://localhost/mydb")?;
//! up(&migrations, &mut store, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! The `tracing` feature adds spans and events around migration
//! execution; the `testing` feature exposes [`testing::MemoryStore`]
//! for exercising migration logic without a database.

mod error;
pub use error::Error;

mod statement;
pub use statement::split_statements;

mod source;
pub use source::{Migration, Source};

mod store;
pub use store::Store;

mod postgres;
pub use postgres::PgStore;

mod up;
pub use up::{up, up_with_output};

mod status;
pub use status::{status, status_with_output};

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(all(test, feature = "pg-integration"))]
pub(crate) mod test_postgres;
