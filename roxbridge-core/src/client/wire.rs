//! Request body encoding and response body decoding.
//!
//! Request: `{"code":"600519","price":10.00,"vol":500.00}`, numbers at fixed
//! two-decimal precision. Response: a bare decimal such as `1.0` or `-1.00`.

use super::SignalError;
use crate::domain::CalcRequest;

/// Largest response body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64;

/// Encode the JSON body for one request.
pub fn encode_body(req: &CalcRequest, unknown_code: &str) -> Result<String, SignalError> {
    if !req.price().is_finite() || !req.volume().is_finite() {
        return Err(SignalError::InvalidInput(format!(
            "non-finite price/volume: {}/{}",
            req.price(),
            req.volume()
        )));
    }
    // serde_json handles quoting and escaping of the code
    let code = serde_json::Value::String(req.instrument().wire_code(unknown_code).to_string());
    Ok(format!(
        "{{\"code\":{code},\"price\":{:.2},\"vol\":{:.2}}}",
        req.price(),
        req.volume()
    ))
}

/// Decode a response body into a signal value.
pub fn parse_signal(body: &[u8]) -> Result<f64, SignalError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(SignalError::Protocol(format!(
            "response body too large ({} bytes)",
            body.len()
        )));
    }
    let text = std::str::from_utf8(body)
        .map_err(|e| SignalError::Protocol(format!("response body is not UTF-8: {e}")))?
        .trim();
    if text.is_empty() {
        return Err(SignalError::Protocol("empty response body".into()));
    }
    let value: f64 = text
        .parse()
        .map_err(|_| SignalError::Protocol(format!("unparseable signal {text:?}")))?;
    if !value.is_finite() {
        return Err(SignalError::Protocol(format!("non-finite signal {text:?}")));
    }
    Ok(value)
}
