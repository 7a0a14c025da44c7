//! CalcResponse — a signal value or an explicit absence of one.

use std::fmt;

/// What an unresolved output slot holds.
pub const NO_SIGNAL_OUTPUT: f32 = 0.0;

/// Outcome of resolving one request.
///
/// `NoSignal` is distinct from `Signal(0.0)`: the former means nothing could be
/// resolved, the latter is a valid "hold" answer from the service. Both end up
/// as `0.0` in the host's buffer, but callers and logs can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalcResponse {
    Signal(f64),
    NoSignal,
}

impl CalcResponse {
    pub fn value(&self) -> Option<f64> {
        match self {
            CalcResponse::Signal(v) => Some(*v),
            CalcResponse::NoSignal => None,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, CalcResponse::Signal(_))
    }

    /// Value as written into the host's `f32` output slot.
    pub fn to_output(&self) -> f32 {
        match self {
            CalcResponse::Signal(v) => *v as f32,
            CalcResponse::NoSignal => NO_SIGNAL_OUTPUT,
        }
    }
}

impl fmt::Display for CalcResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcResponse::Signal(v) => write!(f, "{v}"),
            CalcResponse::NoSignal => f.write_str("no signal"),
        }
    }
}
