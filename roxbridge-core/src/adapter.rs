//! Calculation adapter: the callback-shaped entry point.
//!
//! Per call: validate, default-fill the output, pick the newest data point,
//! resolve it through the cache, write the one resolved slot. No state of its
//! own survives the call; everything persistent lives in the cache and the
//! signal source.
//!
//! Errors are returned for diagnostics only. Whatever the outcome, the output
//! buffer has already been fully initialized, so a host-facing caller may
//! discard the result.

use crate::cache::{Quantizer, SignalCache};
use crate::client::{SignalError, SignalSource};
use crate::config::BridgeConfig;
use crate::domain::{BarSeries, CalcRequest, CalcResponse, Instrument, NO_SIGNAL_OUTPUT};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Parallel input arrays for one invocation, as the host passes them.
#[derive(Debug, Clone, Copy)]
pub struct CalcInput<'a> {
    /// Host-declared element count; may disagree with the slices.
    pub len: i32,
    pub price: &'a [f32],
    pub volume: &'a [f32],
    /// Instrument code if the host exposes one.
    pub instrument: Option<&'a str>,
}

impl<'a> CalcInput<'a> {
    /// Input whose declared length is the price slice's length.
    pub fn new(price: &'a [f32], volume: &'a [f32], instrument: Option<&'a str>) -> Self {
        let len = i32::try_from(price.len()).unwrap_or(i32::MAX);
        Self::with_len(len, price, volume, instrument)
    }

    pub fn with_len(
        len: i32,
        price: &'a [f32],
        volume: &'a [f32],
        instrument: Option<&'a str>,
    ) -> Self {
        Self {
            len,
            price,
            volume,
            instrument,
        }
    }
}

/// Turns host invocations into cached, bounded-latency signal lookups.
pub struct CalcAdapter<S> {
    source: S,
    cache: SignalCache,
    quantizer: Quantizer,
}

impl<S: SignalSource> CalcAdapter<S> {
    pub fn new(source: S, config: &BridgeConfig) -> Self {
        Self::with_parts(
            source,
            SignalCache::new(config.cache_ttl(), config.failure_cooldown()),
            Quantizer::from_config(config),
        )
    }

    pub fn with_parts(source: S, cache: SignalCache, quantizer: Quantizer) -> Self {
        Self {
            source,
            cache,
            quantizer,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &SignalCache {
        &self.cache
    }

    /// Evaluate the host's price/volume arrays into `out`.
    ///
    /// Returns `Ok(None)` for empty input, `Ok(Some(_))` with the value written
    /// to the last slot, or the error that left it at the default.
    pub fn evaluate(
        &self,
        input: &CalcInput<'_>,
        out: &mut [f32],
    ) -> Result<Option<CalcResponse>, SignalError> {
        out.fill(NO_SIGNAL_OUTPUT);

        let len = checked_len(input.len)?;
        if len == 0 {
            return Ok(None);
        }
        if out.len() < len || input.price.len() < len || input.volume.len() < len {
            return Err(invalid(format!(
                "declared length {len} exceeds buffers (out {}, price {}, volume {})",
                out.len(),
                input.price.len(),
                input.volume.len()
            )));
        }

        let last = len - 1;
        let response = self.resolve_point(
            Instrument::from_label(input.instrument),
            input.price[last],
            input.volume[last],
            Utc::now(),
        )?;
        out[last] = response.to_output();
        Ok(Some(response))
    }

    /// Evaluate a full bar series, using the last bar's close, volume and time.
    ///
    /// For hosts that expose their bar records and instrument label.
    pub fn evaluate_series(
        &self,
        series: &BarSeries<'_>,
        instrument: Option<&str>,
        out: &mut [f32],
    ) -> Result<Option<CalcResponse>, SignalError> {
        out.fill(NO_SIGNAL_OUTPUT);

        let Some(bar) = series.last() else {
            return Ok(None);
        };
        if out.len() < series.len() {
            return Err(invalid(format!(
                "output buffer ({}) shorter than series ({})",
                out.len(),
                series.len()
            )));
        }

        let as_of = bar.timestamp().unwrap_or_else(Utc::now);
        let response = self.resolve_point(
            Instrument::from_label(instrument),
            bar.close,
            bar.volume,
            as_of,
        )?;
        out[series.len() - 1] = response.to_output();
        Ok(Some(response))
    }

    fn resolve_point(
        &self,
        instrument: Instrument,
        price: f32,
        volume: f32,
        as_of: DateTime<Utc>,
    ) -> Result<CalcResponse, SignalError> {
        if !price.is_finite() || !volume.is_finite() {
            return Err(invalid(format!("non-finite last point: price={price} volume={volume}")));
        }

        let req = CalcRequest::new(instrument, f64::from(price), f64::from(volume), as_of);
        let key = self.quantizer.key(&req);
        self.cache.resolve(key, || self.source.fetch_signal(&req))
    }
}

fn checked_len(len: i32) -> Result<usize, SignalError> {
    usize::try_from(len).map_err(|_| invalid(format!("negative data length {len}")))
}

fn invalid(msg: String) -> SignalError {
    debug!(reason = %msg, "rejecting host input");
    SignalError::InvalidInput(msg)
}
