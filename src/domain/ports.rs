use super::balance::AccountKey;
use crate::error::StoreError;
use async_trait::async_trait;

/// Result of a decrement that only applies when the balance covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalDecrement {
    /// The amount was subtracted; carries the new value.
    Applied(i64),
    /// The stored value was too low and was left as is; carries that value.
    Declined(i64),
}

/// Entry point to a key-value backend holding balances.
///
/// Each call to [`BalanceStore::connect`] opens a fresh session. Sessions are
/// never pooled or shared between gate calls.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn connect(&self) -> Result<BalanceConnectionBox, StoreError>;
}

/// One open session against a [`BalanceStore`].
#[async_trait]
pub trait BalanceConnection: Send {
    /// Raw stored text for `key`, `None` when the key does not exist.
    async fn get(&mut self, key: &AccountKey) -> Result<Option<String>, StoreError>;

    /// Subtracts `amount` in a single store-side operation and returns the
    /// new value. A missing key counts as 0.
    async fn decrement_by(&mut self, key: &AccountKey, amount: i64) -> Result<i64, StoreError>;

    /// Subtracts `amount` only if the current value is at least `amount`.
    /// The check and the write happen atomically on the store.
    async fn decrement_if_covered(
        &mut self,
        key: &AccountKey,
        amount: i64,
    ) -> Result<ConditionalDecrement, StoreError>;

    async fn set(&mut self, key: &AccountKey, value: i64) -> Result<(), StoreError>;

    /// Closes the session. Anything but a clean acknowledgement is an error.
    async fn disconnect(self: Box<Self>) -> Result<(), StoreError>;
}

pub type BalanceStoreBox = Box<dyn BalanceStore>;
pub type BalanceConnectionBox = Box<dyn BalanceConnection>;
