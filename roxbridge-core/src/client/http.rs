//! HTTP signal client for the local scoring service.
//!
//! One long-lived session is shared by every caller. It is built lazily on
//! first use, cloned out of its lock for each exchange (so exchanges run
//! independently), and dropped after a connection failure or timeout so the
//! next call starts clean. Every exchange is bounded by the request timeout.

use super::wire::{encode_body, parse_signal, MAX_BODY_BYTES};
use super::{SignalError, SignalSource};
use crate::config::BridgeConfig;
use crate::domain::{CalcRequest, CalcResponse};
use reqwest::blocking::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("RoxTdxBridge/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for `POST {servicePath}`.
pub struct SignalClient {
    url: String,
    timeout: Duration,
    unknown_code: String,
    session: Mutex<Option<Session>>,
    sessions_opened: AtomicU64,
}

/// A built client and its build number, so a failure on an old handle
/// cannot discard a newer session.
#[derive(Clone)]
struct Session {
    generation: u64,
    client: Client,
}

impl SignalClient {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            url: config.service_url(),
            timeout: config.request_timeout(),
            unknown_code: config.unknown_code.clone(),
            session: Mutex::new(None),
            sessions_opened: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of sessions built so far (1 in steady state).
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    /// Current session, building one if there is none.
    ///
    /// Setup is serialized by the lock; the returned handle is a cheap clone
    /// sharing the same connection pool.
    fn session(&self) -> Result<Session, SignalError> {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SignalError::Connection(format!("session setup failed: {e}")))?;

        let generation = self.sessions_opened.fetch_add(1, Ordering::Relaxed) + 1;
        info!(url = %self.url, sessions_opened = generation, "scoring service session established");
        let session = Session { generation, client };
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Drop the session built as `generation`, if it is still current.
    fn drop_session(&self, generation: u64) {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            *slot = None;
            debug!(url = %self.url, generation, "scoring service session dropped");
        }
    }

    /// One request/response exchange on `client`, bounded as a whole by the
    /// request timeout.
    ///
    /// The per-request timeout covers connect through the end of the body.
    /// Each phase is also checked against the shared deadline, so a server
    /// that sends headers and then stalls cannot stretch the exchange.
    fn exchange(&self, client: &Client, body: String) -> Result<f64, SignalError> {
        let deadline = Instant::now() + self.timeout;

        let resp = client
            .post(&self.url)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| self.classify(e, deadline))?;
        self.check_deadline(deadline)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SignalError::Protocol(format!("HTTP {status}")));
        }
        if let Some(len) = resp.content_length() {
            if len as usize > MAX_BODY_BYTES {
                return Err(SignalError::Protocol(format!(
                    "response body too large ({len} bytes)"
                )));
            }
        }

        let bytes = resp.bytes().map_err(|e| self.classify(e, deadline))?;
        self.check_deadline(deadline)?;
        parse_signal(&bytes)
    }

    fn check_deadline(&self, deadline: Instant) -> Result<(), SignalError> {
        if Instant::now() > deadline {
            Err(SignalError::Timeout(self.timeout))
        } else {
            Ok(())
        }
    }

    fn classify(&self, err: reqwest::Error, deadline: Instant) -> SignalError {
        if err.is_timeout() || Instant::now() >= deadline {
            SignalError::Timeout(self.timeout)
        } else {
            SignalError::Connection(err.to_string())
        }
    }
}

impl SignalSource for SignalClient {
    fn name(&self) -> &str {
        "rox_scoring_service"
    }

    fn fetch_signal(&self, req: &CalcRequest) -> Result<CalcResponse, SignalError> {
        let body = encode_body(req, &self.unknown_code)?;
        let session = self.session()?;
        let started = Instant::now();

        match self.exchange(&session.client, body) {
            Ok(value) => {
                debug!(
                    instrument = %req.instrument(),
                    price = req.price(),
                    volume = req.volume(),
                    value,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "signal fetched"
                );
                Ok(CalcResponse::Signal(value))
            }
            Err(err) => {
                if err.poisons_session() {
                    self.drop_session(session.generation);
                }
                warn!(
                    instrument = %req.instrument(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "signal fetch failed"
                );
                Err(err)
            }
        }
    }
}
