//! Cache keys and the quantization that builds them.

use crate::config::BridgeConfig;
use crate::domain::{CalcRequest, Instrument};

/// (instrument, quantized price, quantized volume).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub instrument: Instrument,
    pub price_tick: i64,
    pub volume_tick: i64,
}

/// Rounds price and volume onto a grid so near-identical refreshes share a key.
///
/// A step of 0 disables rounding for that field and keys on the exact value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    pub price_step: f64,
    pub volume_step: f64,
}

impl Quantizer {
    pub fn new(price_step: f64, volume_step: f64) -> Self {
        Self {
            price_step,
            volume_step,
        }
    }

    pub fn exact() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.price_step, config.volume_step)
    }

    pub fn key(&self, req: &CalcRequest) -> CacheKey {
        CacheKey {
            instrument: req.instrument().clone(),
            price_tick: tick(req.price(), self.price_step),
            volume_tick: tick(req.volume(), self.volume_step),
        }
    }
}

fn tick(value: f64, step: f64) -> i64 {
    if step > 0.0 {
        (value / step).round() as i64
    } else {
        // +0.0 folds -0.0 onto 0.0
        (value + 0.0).to_bits() as i64
    }
}
