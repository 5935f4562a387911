//! Balance store adapters.

pub mod in_memory;
#[cfg(feature = "store-redis")]
pub mod redis;
