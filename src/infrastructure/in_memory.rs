use crate::domain::balance::AccountKey;
use crate::domain::ports::{
    BalanceConnection, BalanceConnectionBox, BalanceStore, ConditionalDecrement,
};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

type Entries = Arc<RwLock<HashMap<String, String>>>;

/// A thread-safe in-memory balance store.
///
/// Values are kept as text, like a key-value server would keep them, and the
/// decrement operations mirror `DECRBY`: a missing key counts as 0 and a
/// non-integer value is an error. Clones share the same entries.
#[derive(Default, Clone)]
pub struct InMemoryBalanceStore {
    entries: Entries,
    live: Arc<AtomicUsize>,
}

impl InMemoryBalanceStore {
    /// Creates a new, empty in-memory balance store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` with `value` without going through a connection.
    pub async fn put(&self, key: &AccountKey, value: i64) {
        self.put_raw(key, value.to_string()).await;
    }

    /// Stores arbitrary text under `key`.
    pub async fn put_raw(&self, key: &AccountKey, raw: impl Into<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.as_str().to_string(), raw.into());
    }

    /// Stored text for `key`.
    pub async fn raw(&self, key: &AccountKey) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key.as_str()).cloned()
    }

    /// Number of connections opened and not yet disconnected.
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn connect(&self) -> Result<BalanceConnectionBox, StoreError> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection {
            entries: Arc::clone(&self.entries),
            live: Arc::clone(&self.live),
        }))
    }
}

struct InMemoryConnection {
    entries: Entries,
    live: Arc<AtomicUsize>,
}

fn stored_integer(entries: &HashMap<String, String>, key: &AccountKey) -> Result<i64, StoreError> {
    match entries.get(key.as_str()) {
        None => Ok(0),
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            StoreError::Backend("value is not an integer or out of range".to_string())
        }),
    }
}

fn checked_sub(current: i64, amount: i64) -> Result<i64, StoreError> {
    current
        .checked_sub(amount)
        .ok_or_else(|| StoreError::Backend("decrement would overflow".to_string()))
}

#[async_trait]
impl BalanceConnection for InMemoryConnection {
    async fn get(&mut self, key: &AccountKey) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key.as_str()).cloned())
    }

    async fn decrement_by(&mut self, key: &AccountKey, amount: i64) -> Result<i64, StoreError> {
        let mut entries = self.entries.write().await;
        let updated = checked_sub(stored_integer(&entries, key)?, amount)?;
        entries.insert(key.as_str().to_string(), updated.to_string());
        Ok(updated)
    }

    async fn decrement_if_covered(
        &mut self,
        key: &AccountKey,
        amount: i64,
    ) -> Result<ConditionalDecrement, StoreError> {
        let mut entries = self.entries.write().await;
        let current = stored_integer(&entries, key)?;
        if current < amount {
            return Ok(ConditionalDecrement::Declined(current));
        }
        let updated = checked_sub(current, amount)?;
        entries.insert(key.as_str().to_string(), updated.to_string());
        Ok(ConditionalDecrement::Applied(updated))
    }

    async fn set(&mut self, key: &AccountKey, value: i64) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.as_str().to_string(), value.to_string());
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> Result<(), StoreError> {
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
