//! The store interface the migration engine runs against.

use std::collections::HashSet;

use crate::error::Error;

/// A database that migrations are applied to and recorded in.
///
/// The engine treats the store as a single serialized resource: all
/// operations are synchronous and blocking. Implementations must
/// uphold at most one applied record per migration name.
pub trait Store {
    /// Attempts to acquire the exclusive migration lock for this
    /// database. Returns `false` immediately if another process holds
    /// it; there is no polling or backoff.
    fn try_lock(&mut self) -> Result<bool, Error>;

    /// Releases the exclusive migration lock. Returns `false` if this
    /// connection did not hold it.
    fn unlock(&mut self) -> Result<bool, Error>;

    /// Returns the names of all migrations recorded as applied.
    fn applied_names(&mut self) -> Result<HashSet<String>, Error>;

    /// Executes a single SQL statement.
    fn execute(&mut self, sql: &str) -> Result<(), Error>;

    /// Records that the named migration has been fully applied.
    fn record_applied(&mut self, name: &str) -> Result<(), Error>;
}
