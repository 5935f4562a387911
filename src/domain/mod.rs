//! Domain types and the storage ports the gate is written against.

pub mod balance;
pub mod ports;
