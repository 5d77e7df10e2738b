//! Fire-and-forget heartbeat dispatch.
//!
//! [`HeartbeatDispatcher::fire`] starts a dedicated thread with its own
//! single-threaded runtime, sends one `HEAD` request, and returns at once.
//! The caller may wait a bounded time for the thread to finish, but never
//! learns the outcome: every failure is logged and dropped.

use std::sync::mpsc;
use std::time::Duration;

use aau_core::constants::ENV_HEARTBEAT_DRY_RUN;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::errors::HeartbeatError;

/// Fallback probe deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Completion signal for a dispatched heartbeat.
#[derive(Debug)]
pub struct HeartbeatHandle {
    done: Option<mpsc::Receiver<()>>,
}

impl HeartbeatHandle {
    /// A handle for a heartbeat that was never sent.
    fn completed() -> Self {
        Self { done: None }
    }

    /// Wait up to `limit` for the heartbeat thread to finish.
    ///
    /// Returns `true` if it finished (successfully or not) in time.
    pub fn join_within(&self, limit: Duration) -> bool {
        match &self.done {
            None => true,
            Some(rx) => match rx.recv_timeout(limit) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => true,
                Err(mpsc::RecvTimeoutError::Timeout) => false,
            },
        }
    }
}

/// Sends activation heartbeats.
#[derive(Clone, Debug)]
pub struct HeartbeatDispatcher {
    timeout: Duration,
    dry_run: bool,
}

impl Default for HeartbeatDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HeartbeatDispatcher {
    /// Dispatcher abandoning each probe after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            dry_run: false,
        }
    }

    /// Dispatcher honoring `AAU_HEARTBEAT_DRY_RUN`.
    pub fn from_env(timeout: Duration) -> Self {
        let dry_run = std::env::var(ENV_HEARTBEAT_DRY_RUN).is_ok_and(|v| !v.is_empty());
        Self::new(timeout).with_dry_run(dry_run)
    }

    /// Resolve and log, but never send.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Probe deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one heartbeat to `url` on a background thread.
    ///
    /// `user_agent` is sent verbatim; an empty string sends no `User-Agent`.
    pub fn fire(&self, url: &str, user_agent: &str) -> HeartbeatHandle {
        debug!(url, user_agent, "heartbeat");
        if self.dry_run {
            debug!("dry run selected, not sending heartbeat");
            return HeartbeatHandle::completed();
        }

        let (tx, rx) = mpsc::channel();
        let url = url.to_string();
        let user_agent = user_agent.to_string();
        let timeout = self.timeout;
        let spawned = std::thread::Builder::new()
            .name("aau-heartbeat".into())
            .spawn(move || {
                match run_probe(&url, &user_agent, timeout) {
                    Ok(status) => debug!(status, "heartbeat sent"),
                    Err(e) => debug!(error = %e, "heartbeat failed"),
                }
                let _ = tx.send(());
            });
        match spawned {
            Ok(_) => HeartbeatHandle { done: Some(rx) },
            Err(e) => {
                debug!(error = %e, "could not start heartbeat thread");
                HeartbeatHandle::completed()
            }
        }
    }
}

fn run_probe(url: &str, user_agent: &str, timeout: Duration) -> Result<u16, HeartbeatError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(probe(url, user_agent, timeout))
}

/// Send a single `HEAD` request and report its status.
///
/// Non-success statuses are errors; so is exceeding `timeout`.
pub async fn probe(url: &str, user_agent: &str, timeout: Duration) -> Result<u16, HeartbeatError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| HeartbeatError::InvalidUrl {
        url: url.to_string(),
    })?;
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let mut request = client.head(parsed);
    if !user_agent.is_empty() {
        request = request.header(USER_AGENT, user_agent);
    }

    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let response = match tokio::time::timeout(timeout, request.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) if e.is_timeout() => return Err(HeartbeatError::Timeout { timeout_ms }),
        Ok(Err(e)) => return Err(HeartbeatError::Network(e)),
        Err(_) => return Err(HeartbeatError::Timeout { timeout_ms }),
    };

    let status = response.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(HeartbeatError::Status {
            status: status.as_u16(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
