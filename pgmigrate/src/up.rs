//! Applying pending migrations.

use std::io::{self, Write};
use std::time::Instant;

use crate::error::Error;
use crate::source::Migration;
use crate::store::Store;

/// Applies all pending migrations to the store, writing progress to
/// stderr.
///
/// Migrations must be supplied in ascending version order, as returned
/// by [`Source::find_migrations`](crate::Source::find_migrations).
/// Each pending migration is split into statements, executed in order,
/// and recorded as applied once all of its statements succeed. The
/// first failing statement aborts the entire run; migrations recorded
/// before the failure stay applied.
///
/// A cross-process advisory lock serializes concurrent runs: if another
/// process holds the lock, this returns [`Error::LockContended`]
/// without executing or recording anything. The lock is released on
/// every exit path.
///
/// With `quiet` set, progress output is buffered and only written if
/// the run fails.
pub fn up(migrations: &[Migration], store: &mut dyn Store, quiet: bool) -> Result<(), Error> {
    up_with_output(migrations, store, quiet, &mut io::stderr())
}

/// Like [`up`], but writes progress to the given sink.
pub fn up_with_output(
    migrations: &[Migration],
    store: &mut dyn Store,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let mut log = Reporter::new(out, quiet);
    let result = run_up(migrations, store, &mut log);
    if result.is_err() {
        log.flush();
    }
    result
}

fn run_up(
    migrations: &[Migration],
    store: &mut dyn Store,
    log: &mut Reporter<'_>,
) -> Result<(), Error> {
    // Point-in-time snapshot; not re-checked per statement.
    let applied = store.applied_names()?;
    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !applied.contains(&m.name))
        .collect();

    if pending.is_empty() {
        log.line("nothing to do");
        return Ok(());
    }

    match store.try_lock() {
        Ok(true) => {}
        Ok(false) => return Err(Error::LockContended),
        Err(e) => return Err(Error::Lock(Box::new(e))),
    }

    // Release the lock on every exit path. A run error takes
    // precedence over an unlock error.
    let result = apply_pending(&pending, store, log);
    let unlocked = store.unlock();
    result?;
    unlocked.map_err(|e| Error::Unlock(Box::new(e)))?;
    Ok(())
}

fn apply_pending(
    pending: &[&Migration],
    store: &mut dyn Store,
    log: &mut Reporter<'_>,
) -> Result<(), Error> {
    for m in pending {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("migration_up", name = %m.name).entered();

        log.line(&format!("Running {}:", m.name));
        let statements = m.read_statements()?;
        for stmt in &statements {
            log.line(&prefix_lines("> ", stmt));
            let start = Instant::now();
            let result = store.execute(stmt);
            let elapsed = start.elapsed();
            if let Err(e) = result {
                log.line(&format!("=> FAIL ({:?})", elapsed));
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "statement failed");
                return Err(e);
            }
            log.line(&format!("=> OK ({:?})", elapsed));
        }

        store.record_applied(&m.name).map_err(|e| Error::Record {
            name: m.name.clone(),
            source: Box::new(e),
        })?;

        #[cfg(feature = "tracing")]
        tracing::info!("migration applied");
    }
    Ok(())
}

/// Prefixes every line of the trimmed statement.
fn prefix_lines(prefix: &str, stmt: &str) -> String {
    stmt.trim()
        .lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Progress output sink: write-through normally, buffer-then-flush in
/// quiet mode.
struct Reporter<'a> {
    out: &'a mut dyn Write,
    quiet: bool,
    buf: String,
}

impl<'a> Reporter<'a> {
    fn new(out: &'a mut dyn Write, quiet: bool) -> Self {
        Self {
            out,
            quiet,
            buf: String::new(),
        }
    }

    fn line(&mut self, msg: &str) {
        if self.quiet {
            self.buf.push_str(msg);
            self.buf.push('\n');
        } else {
            let _ = writeln!(self.out, "{}", msg);
        }
    }

    /// Writes the buffered transcript out. Only meaningful in quiet
    /// mode; called when the run fails.
    fn flush(&mut self) {
        if self.quiet && !self.buf.is_empty() {
            let _ = self.out.write_all(self.buf.as_bytes());
        }
    }
}
