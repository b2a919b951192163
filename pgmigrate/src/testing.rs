//! Testing utilities: an in-memory [`Store`] fake.
//!
//! [`MemoryStore`] records every executed statement and applied name,
//! models the cross-process lock through shared state (see
//! [`share`](MemoryStore::share)), and can inject failures, so the
//! orchestrator is testable without a database.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::store::Store;

#[derive(Debug, Default)]
struct Shared {
    locked: bool,
    lock_attempts: u32,
    applied: Vec<String>,
    executed: Vec<String>,
}

/// An in-memory migration store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
    holds_lock: bool,
    fail_on: Option<String>,
    fail_record: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a second handle to the same underlying store, modelling
    /// another process connected to the same database.
    pub fn share(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            holds_lock: false,
            fail_on: self.fail_on.clone(),
            fail_record: self.fail_record,
        }
    }

    /// Fails any executed statement containing the given fragment.
    pub fn fail_on(mut self, fragment: impl Into<String>) -> Self {
        self.fail_on = Some(fragment.into());
        self
    }

    /// Fails every attempt to record an applied migration.
    pub fn fail_record(mut self) -> Self {
        self.fail_record = true;
        self
    }

    /// Pre-seeds an applied record.
    pub fn mark_applied(&mut self, name: &str) {
        self.shared.lock().unwrap().applied.push(name.to_string());
    }

    /// All statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.shared.lock().unwrap().executed.clone()
    }

    /// All applied names recorded so far, in order.
    pub fn applied(&self) -> Vec<String> {
        self.shared.lock().unwrap().applied.clone()
    }

    /// Whether any handle currently holds the lock.
    pub fn lock_held(&self) -> bool {
        self.shared.lock().unwrap().locked
    }

    /// How many times `try_lock` has been called across all handles.
    pub fn lock_attempts(&self) -> u32 {
        self.shared.lock().unwrap().lock_attempts
    }
}

impl Store for MemoryStore {
    fn try_lock(&mut self) -> Result<bool, Error> {
        let mut shared = self.shared.lock().unwrap();
        shared.lock_attempts += 1;
        if shared.locked {
            return Ok(false);
        }
        shared.locked = true;
        self.holds_lock = true;
        Ok(true)
    }

    fn unlock(&mut self) -> Result<bool, Error> {
        if !self.holds_lock {
            return Ok(false);
        }
        self.shared.lock().unwrap().locked = false;
        self.holds_lock = false;
        Ok(true)
    }

    fn applied_names(&mut self) -> Result<HashSet<String>, Error> {
        Ok(self.shared.lock().unwrap().applied.iter().cloned().collect())
    }

    fn execute(&mut self, sql: &str) -> Result<(), Error> {
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(Error::Generic(format!("forced failure: {}", sql)));
            }
        }
        self.shared.lock().unwrap().executed.push(sql.to_string());
        Ok(())
    }

    fn record_applied(&mut self, name: &str) -> Result<(), Error> {
        if self.fail_record {
            return Err(Error::Generic("forced record failure".to_string()));
        }
        self.shared.lock().unwrap().applied.push(name.to_string());
        Ok(())
    }
}
