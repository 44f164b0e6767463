//! Cache key scheme and key-value drivers for the listing cache.
//!
//! The listing layer never talks to a concrete backend; it holds a
//! [`KeyValueCache`] capability. Production deployments point it at Redis
//! (`infra::redis`), single-process runs and tests use [`MemoryCache`].

mod driver;
mod keys;
mod memory;

pub use driver::{CacheError, KeyValueCache};
pub use keys::ListingKeys;
pub use memory::MemoryCache;
