#![allow(dead_code)]

use async_trait::async_trait;
use chargegate::application::gate::ChargeGate;
use chargegate::config::{ChargeMode, GateConfig};
use chargegate::domain::balance::AccountKey;
use chargegate::domain::ports::{
    BalanceConnection, BalanceConnectionBox, BalanceStore, ConditionalDecrement,
};
use chargegate::error::StoreError;
use chargegate::infrastructure::in_memory::InMemoryBalanceStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Failures a [`ScriptedStore`] injects, by operation.
#[derive(Clone, Default)]
pub struct Faults {
    pub connect: Option<String>,
    pub get: Option<String>,
    pub set: Option<String>,
    pub decrement: Option<String>,
    /// Transport failure while closing.
    pub disconnect: Option<String>,
    /// Close succeeds on the wire but answers with this instead of "OK".
    pub disconnect_ack: Option<String>,
}

/// In-memory store that can fail on demand and hold readers at a barrier.
#[derive(Clone)]
pub struct ScriptedStore {
    pub inner: InMemoryBalanceStore,
    faults: Faults,
    after_read: Option<Arc<Barrier>>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl ScriptedStore {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: InMemoryBalanceStore::new(),
            faults,
            after_read: None,
            connects: Arc::new(AtomicUsize::new(0)),
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every connection wait after `get` until `parties` readers arrived.
    pub fn with_read_barrier(mut self, parties: usize) -> Self {
        self.after_read = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

fn fail(message: &Option<String>) -> Result<(), StoreError> {
    match message {
        Some(message) => Err(StoreError::Backend(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl BalanceStore for ScriptedStore {
    async fn connect(&self) -> Result<BalanceConnectionBox, StoreError> {
        fail(&self.faults.connect)?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            inner: self.inner.connect().await?,
            faults: self.faults.clone(),
            after_read: self.after_read.clone(),
            disconnects: Arc::clone(&self.disconnects),
        }))
    }
}

struct ScriptedConnection {
    inner: BalanceConnectionBox,
    faults: Faults,
    after_read: Option<Arc<Barrier>>,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl BalanceConnection for ScriptedConnection {
    async fn get(&mut self, key: &AccountKey) -> Result<Option<String>, StoreError> {
        fail(&self.faults.get)?;
        let raw = self.inner.get(key).await?;
        if let Some(barrier) = &self.after_read {
            barrier.wait().await;
        }
        Ok(raw)
    }

    async fn decrement_by(&mut self, key: &AccountKey, amount: i64) -> Result<i64, StoreError> {
        fail(&self.faults.decrement)?;
        self.inner.decrement_by(key, amount).await
    }

    async fn decrement_if_covered(
        &mut self,
        key: &AccountKey,
        amount: i64,
    ) -> Result<ConditionalDecrement, StoreError> {
        fail(&self.faults.decrement)?;
        self.inner.decrement_if_covered(key, amount).await
    }

    async fn set(&mut self, key: &AccountKey, value: i64) -> Result<(), StoreError> {
        fail(&self.faults.set)?;
        self.inner.set(key, value).await
    }

    async fn disconnect(self: Box<Self>) -> Result<(), StoreError> {
        let ScriptedConnection {
            inner,
            faults,
            disconnects,
            ..
        } = *self;
        disconnects.fetch_add(1, Ordering::SeqCst);
        inner.disconnect().await?;
        fail(&faults.disconnect)?;
        match faults.disconnect_ack {
            Some(ack) => Err(StoreError::UnexpectedAck(ack)),
            None => Ok(()),
        }
    }
}

pub fn gate_over(store: &ScriptedStore, mode: ChargeMode) -> ChargeGate {
    ChargeGate::new(Box::new(store.clone()), GateConfig::default().with_mode(mode))
        .expect("default config is valid")
}

pub async fn seeded_store(faults: Faults, balance: i64) -> ScriptedStore {
    let store = ScriptedStore::new(faults);
    store.inner.put(&AccountKey::default(), balance).await;
    store
}
