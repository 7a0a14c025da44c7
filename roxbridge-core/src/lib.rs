//! RoxBridge Core — the remote-signal bridge between a charting host's formula
//! callback and a local scoring service.
//!
//! Layers, leaves first:
//! - Domain types (bar records, calculation requests, signal values)
//! - Signal client: one bounded-latency HTTP exchange per request, reusing a session
//! - Result cache / coalescer: TTL'd results, failure cooldown, one fetch in flight per key
//! - Calculation adapter: the callback-shaped entry point that never fails outward

pub mod adapter;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;

pub use adapter::{CalcAdapter, CalcInput};
pub use cache::{CacheKey, CacheStats, Quantizer, SignalCache};
pub use client::{SignalClient, SignalError, SignalSource};
pub use config::{BridgeConfig, ConfigError};
pub use domain::{BarSeries, CalcRequest, CalcResponse, Instrument, StkData};
