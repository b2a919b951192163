//! Reading (and generating) migration source files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Error;
use crate::statement::split_statements;

/// A handle to a directory containing migration source files.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
}

impl Source {
    /// Creates a new `Source`, or returns an error if the path does not
    /// exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(Error::Generic(format!(
                "directory does not exist: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    /// Finds all migrations under the source path, sorted ascending by
    /// version. Two migrations sharing a version are ordered by name,
    /// so the listing is deterministic regardless of discovery order.
    pub fn find_migrations(&self) -> Result<Vec<Migration>, Error> {
        let mut result = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            result.push(Migration::parse(path)?);
        }
        result.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(result)
    }

    /// Generates a new, empty migration source file named with the
    /// current UTC timestamp, and returns its path.
    pub fn create(&self, name: &str) -> Result<PathBuf, Error> {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let path = self.path.join(format!("{}_{}.sql", timestamp, name));
        fs::File::create(&path)?;
        Ok(path)
    }
}

/// A handle to a single migration source file.
///
/// The script itself is not read until [`read_statements`](Self::read_statements)
/// is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    /// Path of the source file.
    pub path: PathBuf,
    /// Name of the migration, derived from the file name. This is the
    /// key under which the migration is recorded as applied, and must
    /// never change once applied.
    pub name: String,
    /// Numeric version parsed from the file name prefix, used to order
    /// migrations.
    pub version: u64,
}

impl Migration {
    /// Parses a `<version>_<description>.sql` path into a `Migration`.
    pub(crate) fn parse(path: PathBuf) -> Result<Self, Error> {
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidFileName(path.display().to_string()))?;
        let name = base.strip_suffix(".sql").unwrap_or(base);
        let (prefix, _) = name
            .split_once('_')
            .ok_or_else(|| Error::InvalidFileName(base.to_string()))?;
        let version: u64 = prefix
            .parse()
            .map_err(|_| Error::InvalidFileName(base.to_string()))?;
        let name = name.to_string();
        Ok(Self {
            path,
            name,
            version,
        })
    }

    /// Reads the migration file and splits it into individual
    /// statements.
    pub fn read_statements(&self) -> Result<Vec<String>, Error> {
        let script = fs::read_to_string(&self.path).map_err(|source| Error::ReadMigration {
            name: self.name.clone(),
            source,
        })?;
        Ok(split_statements(&script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_migration(dir: &Path, file: &str, script: &str) {
        fs::write(dir.join(file), script).unwrap();
    }

    #[test]
    fn parse_migration() {
        let m = Migration::parse(PathBuf::from("./migrations/123_add_tables_to_db.sql")).unwrap();
        assert_eq!(m.name, "123_add_tables_to_db");
        assert_eq!(m.version, 123);
        assert_eq!(m.path, PathBuf::from("./migrations/123_add_tables_to_db.sql"));
    }

    #[test]
    fn parse_rejects_missing_version() {
        let err = Migration::parse(PathBuf::from("add_tables.sql")).unwrap_err();
        assert!(matches!(err, Error::InvalidFileName(_)));

        let err = Migration::parse(PathBuf::from("x1_add_tables.sql")).unwrap_err();
        assert!(matches!(err, Error::InvalidFileName(_)));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = Source::new("./does-not-exist").unwrap_err();
        assert!(err.to_string().contains("directory does not exist"));
    }

    #[test]
    fn find_migrations_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "10_tenth.sql", "");
        write_migration(dir.path(), "1_first.sql", "");
        write_migration(dir.path(), "2_second.sql", "");
        // Files without the .sql extension are ignored.
        write_migration(dir.path(), "notes.txt", "");

        let source = Source::new(dir.path()).unwrap();
        let names: Vec<String> = source
            .find_migrations()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["1_first", "2_second", "10_tenth"]);
    }

    #[test]
    fn equal_versions_sort_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "1_bravo.sql", "");
        write_migration(dir.path(), "1_alpha.sql", "");

        let source = Source::new(dir.path()).unwrap();
        let names: Vec<String> = source
            .find_migrations()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["1_alpha", "1_bravo"]);
    }

    #[test]
    fn find_migrations_fails_on_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "first.sql", "");

        let source = Source::new(dir.path()).unwrap();
        assert!(source.find_migrations().is_err());
    }

    #[test]
    fn create_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::new(dir.path()).unwrap();

        let path = source.create("add_users_table").unwrap();
        assert!(path.exists());
        let base = path.file_name().unwrap().to_str().unwrap();
        assert!(base.ends_with("_add_users_table.sql"));
        // 14-digit UTC timestamp prefix.
        let m = Migration::parse(path.clone()).unwrap();
        assert!(m.version >= 20000101000000);
    }

    #[test]
    fn read_statements_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(
            dir.path(),
            "1_add_users.sql",
            "create table users(id int);\ncreate index on users(id);",
        );

        let source = Source::new(dir.path()).unwrap();
        let migrations = source.find_migrations().unwrap();
        let stmts = migrations[0].read_statements().unwrap();
        assert_eq!(
            stmts,
            vec!["create table users(id int);", "create index on users(id);"]
        );
    }

    #[test]
    fn read_statements_reports_missing_file() {
        let m = Migration {
            path: PathBuf::from("./missing/1_gone.sql"),
            name: "1_gone".to_string(),
            version: 1,
        };
        let err = m.read_statements().unwrap_err();
        assert!(err.to_string().contains("error reading migration 1_gone"));
    }
}
