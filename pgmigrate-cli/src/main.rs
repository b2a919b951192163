//! Command line interface for pgmigrate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pgmigrate::{status, up, Error, PgStore, Source};

#[derive(Parser)]
#[command(name = "pgmigrate", version)]
#[command(about = "Apply versioned SQL migration files to a PostgreSQL database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all pending migrations
    Up {
        /// Postgres connection string (URL or key/value DSN)
        #[arg(long)]
        conn: String,
        /// Directory containing migration files
        #[arg(long, default_value = ".")]
        src: PathBuf,
        /// Only print output if an error occurs
        #[arg(long)]
        quiet: bool,
    },
    /// Display pending and applied migrations
    Status {
        /// Postgres connection string (URL or key/value DSN)
        #[arg(long)]
        conn: String,
        /// Directory containing migration files
        #[arg(long, default_value = ".")]
        src: PathBuf,
    },
    /// Create a new empty migration file
    Create {
        /// Directory containing migration files
        #[arg(long, default_value = ".")]
        src: PathBuf,
        /// Name of the migration
        name: String,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("migrate: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    match Cli::parse().command {
        Commands::Up { conn, src, quiet } => {
            let source = Source::new(&src)?;
            let migrations = source.find_migrations()?;
            let mut store = PgStore::connect(&conn)?;
            up(&migrations, &mut store, quiet)
        }
        Commands::Status { conn, src } => {
            let source = Source::new(&src)?;
            let migrations = source.find_migrations()?;
            let mut store = PgStore::connect(&conn)?;
            status(&migrations, &mut store)
        }
        Commands::Create { src, name } => {
            let source = Source::new(&src)?;
            let path = source.create(&name)?;
            eprintln!("Created {}", path.display());
            Ok(())
        }
    }
}
