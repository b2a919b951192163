//! Reporting migration status.

use std::io::{self, Write};

use crate::error::Error;
use crate::source::Migration;
use crate::store::Store;

/// Writes every migration and whether it has been applied yet to
/// stderr. Read-only; no lock is taken.
pub fn status(migrations: &[Migration], store: &mut dyn Store) -> Result<(), Error> {
    status_with_output(migrations, store, &mut io::stderr())
}

/// Like [`status`], but writes to the given sink.
pub fn status_with_output(
    migrations: &[Migration],
    store: &mut dyn Store,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let applied = store.applied_names()?;
    let width = migrations.iter().map(|m| m.name.len()).max().unwrap_or(0);
    for m in migrations {
        let state = if applied.contains(&m.name) {
            "applied"
        } else {
            "pending"
        };
        let _ = writeln!(out, "{:<width$} {}", m.name, state, width = width);
    }
    Ok(())
}
