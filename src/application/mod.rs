//! Application layer: the charge gate and its reset operation.
//!
//! `ChargeGate` is the entry point for callers. It owns the injected balance
//! store and drives each call through connect, read or write, and disconnect.

pub mod gate;
