//! Domain types: host bar records, calculation requests, signal values.

pub mod bar;
pub mod request;
pub mod signal;

pub use bar::{BarSeries, StkData};
pub use request::{CalcRequest, Instrument};
pub use signal::{CalcResponse, NO_SIGNAL_OUTPUT};
