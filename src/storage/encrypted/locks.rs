// src/storage/encrypted/locks.rs
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per record id, created on demand and dropped again once
/// nobody holds or waits for it.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

pub struct KeyGuard<'a> {
    table: &'a KeyLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

/// Prunes the entry if `lock` is dropped before the mutex is acquired.
struct Waiting<'a> {
    table: &'a KeyLocks,
    id: &'a str,
    acquired: bool,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: &str) -> KeyGuard<'_> {
        let entry = {
            let mut locks = self.locks.lock();
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let mut waiting = Waiting {
            table: self,
            id,
            acquired: false,
        };
        // Declared after `waiting`, so a cancelled wait drops its clone first
        let acquire = entry.lock_owned();
        let guard = acquire.await;
        waiting.acquired = true;

        KeyGuard {
            table: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, id: &str) {
        let mut locks = self.locks.lock();
        if let Some(entry) = locks.get(id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(id);
            }
        }
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if !self.acquired {
            self.table.prune(self.id);
        }
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release first so the count below only sees the map and any waiters
        drop(self.guard.take());
        self.table.prune(&self.id);
    }
}
