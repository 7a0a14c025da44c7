//! Property tests for adapter invariants.
//!
//! Uses proptest to verify, for arbitrary host arrays:
//! 1. Output length equals input length and every element is defined
//! 2. Only the last slot can carry a signal
//! 3. Empty input never reaches the signal source

use proptest::prelude::*;
use roxbridge_core::{
    CalcAdapter, CalcInput, CalcRequest, CalcResponse, Quantizer, SignalCache, SignalError,
    SignalSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every request with the request's price, or fails if told to.
struct EchoSource {
    calls: AtomicUsize,
    fail: bool,
}

impl SignalSource for EchoSource {
    fn name(&self) -> &str {
        "echo"
    }

    fn fetch_signal(&self, req: &CalcRequest) -> Result<CalcResponse, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SignalError::Connection("down".into()))
        } else {
            Ok(CalcResponse::Signal(req.price()))
        }
    }
}

fn adapter(fail: bool) -> CalcAdapter<EchoSource> {
    CalcAdapter::with_parts(
        EchoSource {
            calls: AtomicUsize::new(0),
            fail,
        },
        SignalCache::new(Duration::from_secs(1), Duration::from_millis(100)),
        Quantizer::exact(),
    )
}

// ── Strategies ───────────────────────────────────────────────────────

fn arb_series() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (0usize..200).prop_flat_map(|n| {
        (
            prop::collection::vec((1.0..5000.0_f32).prop_map(|p| (p * 100.0).round() / 100.0), n),
            prop::collection::vec(0.0..1.0e7_f32, n),
        )
    })
}

// ── Invariants ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn output_is_fully_defined((price, vol) in arb_series(), fail in any::<bool>()) {
        let a = adapter(fail);
        let mut out = vec![f32::NAN; price.len()];
        let _ = a.evaluate(&CalcInput::new(&price, &vol, None), &mut out);

        prop_assert_eq!(out.len(), price.len());
        prop_assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn only_last_slot_carries_signal((price, vol) in arb_series()) {
        let a = adapter(false);
        let mut out = vec![f32::NAN; price.len()];
        let _ = a.evaluate(&CalcInput::new(&price, &vol, None), &mut out);

        if let Some((last, rest)) = out.split_last() {
            prop_assert!(rest.iter().all(|v| *v == 0.0));
            prop_assert_eq!(*last, *price.last().unwrap());
            prop_assert_eq!(a.source().calls.load(Ordering::SeqCst), 1);
        } else {
            prop_assert_eq!(a.source().calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn negative_lengths_never_call_out(len in i32::MIN..0, n in 0usize..8) {
        let a = adapter(false);
        let data = vec![1.0_f32; n];
        let mut out = vec![f32::NAN; n];
        let r = a.evaluate(&CalcInput::with_len(len, &data, &data, None), &mut out);

        prop_assert!(matches!(r, Err(SignalError::InvalidInput(_))));
        prop_assert!(out.iter().all(|v| *v == 0.0));
        prop_assert_eq!(a.source().calls.load(Ordering::SeqCst), 0);
    }
}
