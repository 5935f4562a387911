use crate::domain::balance::{Balance, Charge};
use crate::error::{GateError, Result};

/// Balance restored by a reset.
pub const DEFAULT_BALANCE: i64 = 100;
/// The per-request charge is the default balance divided by this.
pub const CHARGE_DIVISOR: i64 = 20;

/// How the gate applies an authorized charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeMode {
    /// Read, decide in process, then decrement unconditionally.
    ///
    /// Two concurrent requests can both pass the check and both decrement,
    /// leaving the stored balance below zero.
    #[default]
    CheckThenDecrement,
    /// Read, decide, then decrement only if the store still covers the charge.
    /// The balance never goes negative through the gate.
    Conditional,
}

/// Static parameters of a [`ChargeGate`](crate::application::gate::ChargeGate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    pub default_balance: Balance,
    pub charge_divisor: i64,
    pub mode: ChargeMode,
}

impl GateConfig {
    pub fn with_mode(mut self, mode: ChargeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fixed charge per request, derived from the default balance.
    pub fn charge(&self) -> Result<Charge> {
        if self.charge_divisor <= 0 {
            return Err(GateError::Config(format!(
                "charge divisor must be positive, got {}",
                self.charge_divisor
            )));
        }
        Charge::new(self.default_balance.value() / self.charge_divisor)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_balance: Balance::new(DEFAULT_BALANCE),
            charge_divisor: CHARGE_DIVISOR,
            mode: ChargeMode::default(),
        }
    }
}
