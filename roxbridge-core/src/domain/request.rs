//! CalcRequest — what the bridge asks the scoring service about.

use chrono::{DateTime, Utc};
use std::fmt;

/// Instrument identity as far as the host exposes it.
///
/// The standard callback carries only numeric arrays, so identity is
/// best-effort: `Unknown` is the normal case, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instrument {
    Known(String),
    Unknown,
}

impl Instrument {
    /// Build from an optional host label; blank labels count as unknown.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(code) if !code.is_empty() => Instrument::Known(code.to_string()),
            _ => Instrument::Unknown,
        }
    }

    /// The code sent on the wire, substituting `placeholder` when unknown.
    pub fn wire_code<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self {
            Instrument::Known(code) => code,
            Instrument::Unknown => placeholder,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Known(code) => f.write_str(code),
            Instrument::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// One request for a fresh signal. Built per call, immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcRequest {
    instrument: Instrument,
    price: f64,
    volume: f64,
    as_of: DateTime<Utc>,
}

impl CalcRequest {
    pub fn new(instrument: Instrument, price: f64, volume: f64, as_of: DateTime<Utc>) -> Self {
        Self {
            instrument,
            price,
            volume,
            as_of,
        }
    }

    /// Request stamped with the wall-clock time, for hosts that give no bar time.
    pub fn now(instrument: Instrument, price: f64, volume: f64) -> Self {
        Self::new(instrument, price, volume, Utc::now())
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Last bar's time, or the wall-clock time the request was built.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_label_is_unknown() {
        assert_eq!(Instrument::from_label(None), Instrument::Unknown);
        assert_eq!(Instrument::from_label(Some("   ")), Instrument::Unknown);
        assert_eq!(
            Instrument::from_label(Some(" 600519 ")),
            Instrument::Known("600519".into())
        );
    }

    #[test]
    fn wire_code_substitutes_placeholder() {
        assert_eq!(Instrument::Unknown.wire_code("UNKNOWN"), "UNKNOWN");
        assert_eq!(
            Instrument::Known("000001".into()).wire_code("UNKNOWN"),
            "000001"
        );
    }

    #[test]
    fn request_keeps_its_inputs() {
        let req = CalcRequest::now(Instrument::Unknown, 10.0, 500.0);
        assert_eq!(req.price(), 10.0);
        assert_eq!(req.volume(), 500.0);
        assert!(req.as_of() <= Utc::now());
    }
}
