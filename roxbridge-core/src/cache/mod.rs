//! Result cache and request coalescer.

pub mod coalescer;
pub mod key;

pub use coalescer::{CacheEntry, CacheStats, SignalCache};
pub use key::{CacheKey, Quantizer};
