use crate::config::{ChargeMode, GateConfig};
use crate::domain::balance::{AccountKey, Balance, Charge, ChargeResult};
use crate::domain::ports::{
    BalanceConnection, BalanceConnectionBox, BalanceStoreBox, ConditionalDecrement,
};
use crate::error::{Committed, GateError, Result};
use tracing::{debug, info, warn};

/// Authorizes requests against a stored balance and charges them.
///
/// `ChargeGate` keeps no balance state of its own. Every call opens its own
/// store connection, works on it strictly in sequence and closes it again on
/// every exit path, whether the request was authorized, rejected or failed.
pub struct ChargeGate {
    store: BalanceStoreBox,
    config: GateConfig,
    charge: Charge,
}

impl ChargeGate {
    /// Creates a new `ChargeGate` on top of the given store.
    ///
    /// Fails with [`GateError::Config`] when the configuration does not yield
    /// a positive charge.
    pub fn new(store: BalanceStoreBox, config: GateConfig) -> Result<Self> {
        let charge = config.charge()?;
        Ok(Self {
            store,
            config,
            charge,
        })
    }

    /// Charges one request against `account` if its balance covers it.
    ///
    /// A rejected request leaves the store untouched and reports the balance
    /// that was read. Store failures abort the call; a failure to close the
    /// connection is reported as [`GateError::Disconnect`] carrying the charge
    /// that was already applied, if any.
    #[tracing::instrument(skip_all, fields(account = %account))]
    pub async fn charge_request(&self, account: &AccountKey) -> Result<ChargeResult> {
        let mut conn = self.acquire().await?;
        let outcome = self.charge_on(&mut *conn, account).await;
        self.release(conn, outcome, |result: &ChargeResult| {
            if result.is_authorized {
                Committed::Charge(*result)
            } else {
                Committed::Nothing
            }
        })
        .await
    }

    /// Overwrites the balance of `account` with the configured default and
    /// returns it.
    #[tracing::instrument(skip_all, fields(account = %account))]
    pub async fn reset(&self, account: &AccountKey) -> Result<Balance> {
        let mut conn = self.acquire().await?;
        let default = self.config.default_balance;
        let outcome = conn
            .set(account, default.value())
            .await
            .map(|()| default)
            .map_err(GateError::Store);
        if outcome.is_ok() {
            info!(balance = %default, "balance reset");
        }
        self.release(conn, outcome, |balance: &Balance| Committed::Reset(*balance))
            .await
    }

    async fn charge_on(
        &self,
        conn: &mut dyn BalanceConnection,
        account: &AccountKey,
    ) -> Result<ChargeResult> {
        let raw = conn.get(account).await.map_err(GateError::Store)?;
        let balance = Balance::parse_lenient(raw.as_deref());
        debug!(%balance, "balance read");

        if !balance.covers(self.charge) {
            info!(%balance, charge = self.charge.value(), "charge rejected");
            return Ok(ChargeResult::rejected(balance));
        }

        let result = match self.config.mode {
            ChargeMode::CheckThenDecrement => {
                let remaining = conn
                    .decrement_by(account, self.charge.value())
                    .await
                    .map_err(GateError::Store)?;
                ChargeResult::authorized(Balance::new(remaining), self.charge)
            }
            ChargeMode::Conditional => {
                match conn
                    .decrement_if_covered(account, self.charge.value())
                    .await
                    .map_err(GateError::Store)?
                {
                    ConditionalDecrement::Applied(remaining) => {
                        ChargeResult::authorized(Balance::new(remaining), self.charge)
                    }
                    ConditionalDecrement::Declined(current) => {
                        info!(balance = current, "charge rejected after concurrent update");
                        return Ok(ChargeResult::rejected(Balance::new(current)));
                    }
                }
            }
        };

        info!(
            remaining = %result.remaining_balance,
            charges = result.charges,
            "charge authorized"
        );
        Ok(result)
    }

    async fn acquire(&self) -> Result<BalanceConnectionBox> {
        let conn = self.store.connect().await.map_err(GateError::Connection)?;
        debug!("store connection opened");
        Ok(conn)
    }

    /// Closes `conn` whatever `outcome` is.
    ///
    /// The outcome of the operation takes precedence over a close failure. A
    /// close failure after a successful operation becomes the call's error and
    /// records what the operation had written.
    async fn release<T>(
        &self,
        conn: BalanceConnectionBox,
        outcome: Result<T>,
        committed: impl FnOnce(&T) -> Committed,
    ) -> Result<T> {
        let closed = conn.disconnect().await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => {
                debug!("store connection closed");
                Ok(value)
            }
            (Ok(value), Err(source)) => Err(GateError::Disconnect {
                committed: committed(&value),
                source,
            }),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "failed to close store connection after error");
                Err(err)
            }
        }
    }
}
