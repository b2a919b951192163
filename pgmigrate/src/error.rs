/// Error type for the pgmigrate crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Another process holds the migration lock for this database.
    #[error("could not acquire lock")]
    LockContended,
    #[error("error acquiring lock: {0}")]
    Lock(#[source] Box<Error>),
    #[error("error releasing lock: {0}")]
    Unlock(#[source] Box<Error>),
    /// The migration's statements ran, but the applied record could not
    /// be written. The migration may be reapplied on the next run.
    #[error("error recording migration {name}: {source}")]
    Record {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("error reading migration {name}: {source}")]
    ReadMigration {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid migration file name: {0}")]
    InvalidFileName(String),
    #[error("{0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}
