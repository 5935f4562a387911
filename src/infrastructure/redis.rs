use crate::domain::balance::AccountKey;
use crate::domain::ports::{
    BalanceConnection, BalanceConnectionBox, BalanceStore, ConditionalDecrement,
};
use crate::error::StoreError;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::debug;

/// Address used when no URL is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Returns `{1, new_value}` after decrementing, `{0, current}` when the stored
/// value does not cover the amount.
const DECREMENT_IF_COVERED_SCRIPT: &str = r#"
local current = tonumber(redis.call("GET", KEYS[1]) or "0")
if current == nil then
  return redis.error_reply("ERR value is not an integer or out of range")
end

local amount = tonumber(ARGV[1]) or 0
if current < amount then
  return { 0, current }
end

return { 1, redis.call("DECRBY", KEYS[1], amount) }
"#;

/// Balance store backed by a Redis server.
///
/// Holds only the parsed client; every [`BalanceStore::connect`] call opens a
/// new connection that is closed with `QUIT` on disconnect.
#[derive(Clone, Debug)]
pub struct RedisBalanceStore {
    client: redis::Client,
}

impl RedisBalanceStore {
    /// Parses `url` (e.g. `redis://127.0.0.1:6379`). Does not connect.
    pub fn open(url: impl AsRef<str>) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url.as_ref())?,
        })
    }
}

#[async_trait]
impl BalanceStore for RedisBalanceStore {
    async fn connect(&self) -> Result<BalanceConnectionBox, StoreError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!("redis client ready");
        Ok(Box::new(RedisConnection { conn }))
    }
}

struct RedisConnection {
    conn: MultiplexedConnection,
}

#[async_trait]
impl BalanceConnection for RedisConnection {
    async fn get(&mut self, key: &AccountKey) -> Result<Option<String>, StoreError> {
        let raw: Option<String> = self.conn.get(key.as_str()).await?;
        Ok(raw)
    }

    async fn decrement_by(&mut self, key: &AccountKey, amount: i64) -> Result<i64, StoreError> {
        let updated: i64 = self.conn.decr(key.as_str(), amount).await?;
        Ok(updated)
    }

    async fn decrement_if_covered(
        &mut self,
        key: &AccountKey,
        amount: i64,
    ) -> Result<ConditionalDecrement, StoreError> {
        let (applied, value): (i64, i64) = redis::Script::new(DECREMENT_IF_COVERED_SCRIPT)
            .key(key.as_str())
            .arg(amount)
            .invoke_async(&mut self.conn)
            .await?;

        Ok(if applied == 1 {
            ConditionalDecrement::Applied(value)
        } else {
            ConditionalDecrement::Declined(value)
        })
    }

    async fn set(&mut self, key: &AccountKey, value: i64) -> Result<(), StoreError> {
        let _: () = self.conn.set(key.as_str(), value.to_string()).await?;
        Ok(())
    }

    async fn disconnect(self: Box<Self>) -> Result<(), StoreError> {
        let mut conn = self.conn;
        let ack: String = redis::cmd("QUIT").query_async(&mut conn).await?;
        if ack != "OK" {
            return Err(StoreError::UnexpectedAck(ack));
        }
        debug!("redis client disconnected");
        Ok(())
    }
}
