#![allow(dead_code)]

//! PostgreSQL test infrastructure.
//!
//! Starts a single shared PostgreSQL testcontainer and hands each test
//! an isolated, freshly-created database.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Once;

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

use crate::PgStore;

/// Global PostgreSQL container port, set once the container is started
static POSTGRES_PORT: AtomicU16 = AtomicU16::new(0);

/// Ensures the container is started only once
static POSTGRES_INIT: Once = Once::new();

/// Tokio runtime for container management (kept alive for container lifecycle)
static mut TOKIO_RT: Option<tokio::runtime::Runtime> = None;

/// Default credentials for testcontainers-modules postgres
const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_DB: &str = "postgres";

fn ensure_postgres_started() {
    POSTGRES_INIT.call_once(|| {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

        let port = rt.block_on(async {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");

            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get postgres port");

            // Leak the container to keep it alive for the test duration
            std::mem::forget(container);

            port
        });

        POSTGRES_PORT.store(port, Ordering::SeqCst);

        // Store the runtime to keep it alive (and the container with it)
        // Safety: This is only called once via Once::call_once
        unsafe {
            TOKIO_RT = Some(rt);
        }
    });
}

fn get_postgres_port() -> u16 {
    ensure_postgres_started();
    POSTGRES_PORT.load(Ordering::SeqCst)
}

fn url_with_db(db: &str) -> String {
    let port = get_postgres_port();
    format!(
        "postgres://{}:{}@127.0.0.1:{}/{}",
        PG_USER, PG_PASSWORD, port, db
    )
}

/// Creates a fresh PostgreSQL database with a unique name and returns
/// its connection URL.
pub fn fresh_postgres_db() -> String {
    let admin_url = url_with_db(PG_DB);
    let mut admin = Client::connect(&admin_url, NoTls).expect("failed to connect as admin");

    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .execute(&format!("CREATE DATABASE \"{}\"", db_name), &[])
        .expect("failed to create test database");
    drop(admin);

    url_with_db(&db_name)
}

/// Returns a [`PgStore`] connected to a fresh, isolated database.
pub fn fresh_pg_store() -> PgStore {
    PgStore::connect(&fresh_postgres_db()).expect("failed to connect to test database")
}

/// Returns two independent connections to the same fresh database, for
/// lock contention tests.
pub fn two_stores_same_db() -> (PgStore, PgStore) {
    let url = fresh_postgres_db();
    let a = PgStore::connect(&url).expect("failed to connect to test database");
    let b = PgStore::connect(&url).expect("failed to connect to test database");
    (a, b)
}
