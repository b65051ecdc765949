//! Named locks for serializing mutations under a shared parent
//!
//! Some remote APIs reject concurrent writes to children of the same parent
//! (for example role assignments under one Cosmos DB account). Handlers take
//! a lock keyed by `(name, kind)` before mutating and hold it until they
//! return. Entries are created on first use and never removed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Key of a named lock
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub name: String,
    pub kind: String,
}

impl LockKey {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// Table of async mutexes keyed by [`LockKey`]
#[derive(Debug, Default)]
pub struct NamedLocks {
    entries: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

/// Held lock; released when dropped
#[derive(Debug)]
pub struct NamedLockGuard {
    key: LockKey,
    _guard: OwnedMutexGuard<()>,
}

impl NamedLockGuard {
    pub fn key(&self) -> &LockKey {
        &self.key
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        log::debug!("Released lock {}", self.key);
    }
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &LockKey) -> Arc<AsyncMutex<()>> {
        // A poisoned table still holds valid entries
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for the lock named `(name, kind)` and hold it until the guard drops
    pub async fn lock(&self, name: &str, kind: &str) -> NamedLockGuard {
        let key = LockKey::new(name, kind);
        let mutex = self.entry(&key);
        log::debug!("Acquiring lock {}", key);
        let guard = mutex.lock_owned().await;
        log::debug!("Acquired lock {}", key);
        NamedLockGuard { key, _guard: guard }
    }

    /// Number of distinct keys ever locked
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: OnceLock<NamedLocks> = OnceLock::new();

/// The process-wide lock table
pub fn global() -> &'static NamedLocks {
    GLOBAL.get_or_init(NamedLocks::new)
}

/// Lock `(name, kind)` in the process-wide table
pub async fn by_name(name: &str, kind: &str) -> NamedLockGuard {
    global().lock(name, kind).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn same_key_is_serialized() {
        let locks = Arc::new(NamedLocks::new());
        let events = Arc::new(Mutex::new(Vec::new()));

        let run = |label: &'static str| {
            let locks = locks.clone();
            let events = events.clone();
            async move {
                let _guard = locks.lock("acct1", "azurerm_cosmosdb_account").await;
                events.lock().unwrap().push(format!("{label}:start"));
                tokio::time::sleep(Duration::from_secs(5)).await;
                events.lock().unwrap().push(format!("{label}:end"));
            }
        };

        tokio::join!(run("a"), run("b"));

        let events = events.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        // Each start is immediately followed by its own end
        assert_eq!(events[0].split(':').next(), events[1].split(':').next());
        assert_eq!(events[2].split(':').next(), events[3].split(':').next());
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_do_not_block() {
        let locks = NamedLocks::new();
        let a = locks.lock("acct1", "azurerm_cosmosdb_account").await;
        let b = tokio::time::timeout(
            Duration::from_secs(1),
            locks.lock("acct2", "azurerm_cosmosdb_account"),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(a.key().name, "acct1");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn lock_is_released_on_drop() {
        let locks = NamedLocks::new();
        {
            let _guard = locks.lock("acct1", "kind").await;
            let blocked =
                tokio::time::timeout(Duration::from_secs(1), locks.lock("acct1", "kind")).await;
            assert!(blocked.is_err());
        }
        let reacquired =
            tokio::time::timeout(Duration::from_secs(1), locks.lock("acct1", "kind")).await;
        assert!(reacquired.is_ok());
    }
}
