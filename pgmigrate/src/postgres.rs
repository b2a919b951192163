//! PostgreSQL store implementation using the
//! [`postgres`](https://crates.io/crates/postgres) crate.
//!
//! Statements are executed over the simple query protocol, so scripts
//! may contain transaction control (`begin` / `commit`) and statements
//! that refuse to run inside a transaction block, such as
//! `create index concurrently`.
//!
//! Mutual exclusion across processes uses a session-scoped advisory
//! lock keyed by a hash of the database name, so concurrent runs
//! against unrelated databases never contend.

use std::collections::HashSet;

use postgres::{Client, Config, NoTls};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::store::Store;

/// Salt mixed into the advisory lock key so this tool's lock does not
/// collide with application advisory locks on the same database name.
const LOCK_SALT: &[u8] = b"pgmigrate";

/// A migration store backed by a PostgreSQL connection.
pub struct PgStore {
    client: Client,
    database: String,
    ensured: bool,
}

impl PgStore {
    /// Connects to the PostgreSQL database at the given connection
    /// string. Both URL (`postgres://...`) and key/value DSN
    /// (`user=... dbname=...`) forms are accepted.
    pub fn connect(conn: &str) -> Result<Self, Error> {
        let config: Config = conn
            .parse()
            .map_err(|e| Error::Generic(format!("could not parse connection string: {}", e)))?;
        let database = config.get_dbname().unwrap_or_default().to_string();
        let client = config
            .connect(NoTls)
            .map_err(|e| Error::Generic(format!("could not connect to database: {}", e)))?;
        Ok(Self {
            client,
            database,
            ensured: false,
        })
    }

    /// The advisory lock key for this database.
    fn lock_key(&self) -> i64 {
        advisory_lock_key(&self.database)
    }

    /// Ensures that the applied-migrations table exists. The check runs
    /// at most once per connection.
    fn ensure_migrations_table(&mut self) -> Result<(), Error> {
        if self.ensured {
            return Ok(());
        }
        self.client
            .batch_execute("create table if not exists migrations (name text);")?;
        self.ensured = true;
        Ok(())
    }
}

impl Store for PgStore {
    fn try_lock(&mut self) -> Result<bool, Error> {
        let key = self.lock_key();
        let row = self
            .client
            .query_one("select pg_try_advisory_lock($1);", &[&key])?;
        Ok(row.get(0))
    }

    fn unlock(&mut self) -> Result<bool, Error> {
        let key = self.lock_key();
        let row = self
            .client
            .query_one("select pg_advisory_unlock($1);", &[&key])?;
        Ok(row.get(0))
    }

    fn applied_names(&mut self) -> Result<HashSet<String>, Error> {
        self.ensure_migrations_table()?;
        let rows = self.client.query("select name from migrations;", &[])?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<(), Error> {
        self.ensure_migrations_table()?;
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn record_applied(&mut self, name: &str) -> Result<(), Error> {
        self.ensure_migrations_table()?;
        self.client
            .execute("insert into migrations values ($1);", &[&name])?;
        Ok(())
    }
}

/// Derives a stable 64-bit advisory lock key from a database name.
///
/// Any deterministic mapping works here; the key only has to be stable
/// for a given database and unlikely to collide across databases.
fn advisory_lock_key(database: &str) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(database.as_bytes());
    hasher.update(LOCK_SALT);
    let digest = hasher.finalize();
    let mut key = [0u8; 8];
    key.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(key)
}
