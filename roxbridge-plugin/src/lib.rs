//! RoxBridge plugin — the library a charting host loads to evaluate
//! `TDXDLL1(1, CLOSE, VOL, 0)` through the remote scoring service.
//!
//! The host calls [`abi::RegisterTdxFunc`] once, then invokes function 1 on
//! every refresh with the close and volume arrays. Each invocation returns
//! within the configured request timeout with a fully initialized output
//! array; no error and no panic crosses back into the host.
//!
//! Instrument identity: the standard callback receives only numeric arrays,
//! so function 1 always asks about the placeholder instrument. Hosts that can
//! hand over their calculation context use [`rox_signal_series`] instead.

pub mod abi;
pub mod runtime;

use abi::CalcInfo;
use roxbridge_core::domain::NO_SIGNAL_OUTPUT;
use roxbridge_core::{BarSeries, CalcInput};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Function 1: remote signal for the newest bar.
///
/// Inputs: `a` = price (CLOSE), `b` = volume (VOL), `c` unused.
pub(crate) extern "C" fn rox_signal(
    data_len: i32,
    out: *mut f32,
    price: *mut f32,
    volume: *mut f32,
    _unused: *mut f32,
) {
    guarded(|| unsafe { calc_arrays(data_len, out, price, volume) });
}

/// Remote signal from a full calculation context, for hosts that expose one.
///
/// Writes `info.num_data` values to `out`. Returns `TRUE` when the output was
/// written, `FALSE` when the arguments were unusable.
///
/// # Safety
/// `info` must be null or point to a valid [`CalcInfo`] whose pointers obey
/// its documented contract; `out` must be null or valid for `num_data` writes.
#[no_mangle]
pub unsafe extern "C" fn rox_signal_series(info: *const CalcInfo, out: *mut f32) -> abi::HostBool {
    if info.is_null() || out.is_null() {
        return abi::FALSE;
    }
    let written = guarded(|| {
        let info = &*info;
        let Ok(n) = usize::try_from(info.num_data) else {
            return false;
        };
        let out = std::slice::from_raw_parts_mut(out, n);
        let bars = info.bars();
        if bars.len() != n {
            out.fill(NO_SIGNAL_OUTPUT);
            return true;
        }
        let _ = runtime::bridge().evaluate_series(&BarSeries::new(bars), info.label(), out);
        true
    });
    if written == Some(true) {
        abi::TRUE
    } else {
        abi::FALSE
    }
}

/// Run `f`, stopping any panic at the FFI boundary.
fn guarded<T>(f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(_) => {
            error!("panic contained at the host boundary");
            None
        }
    }
}

/// # Safety
/// Non-null pointers must be valid for `data_len` elements.
unsafe fn calc_arrays(data_len: i32, out: *mut f32, price: *const f32, volume: *const f32) {
    let Ok(n) = usize::try_from(data_len) else {
        return;
    };
    if n == 0 || out.is_null() {
        return;
    }

    // Only the newest point is evaluated. Read it before borrowing `out`,
    // which the host may alias with an input array.
    let last = if price.is_null() || volume.is_null() {
        None
    } else {
        Some((*price.add(n - 1), *volume.add(n - 1)))
    };

    let out = std::slice::from_raw_parts_mut(out, n);
    out.fill(NO_SIGNAL_OUTPUT);
    if let Some((price, volume)) = last {
        let (price, volume) = ([price], [volume]);
        let input = CalcInput::new(&price, &volume, None);
        let _ = runtime::bridge().evaluate(&input, &mut out[n - 1..]);
    }
}
