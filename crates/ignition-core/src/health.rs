//! Health probes polled between launch steps.
//!
//! A probe answers one question — is this component ready — and the
//! sequencer polls it at a fixed interval until success or timeout.

use crate::process;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Per-request timeout for HTTP probes.
const PROBE_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for command probes so a hung probe cannot stall the poll loop.
const PROBE_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// HealthProbe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthProbe {
    /// Any 2xx response from `url` means healthy.
    Http { url: String },
    /// 2xx response whose JSON body reports `{"status": "ready"}`.
    Ready { url: String },
    /// Shell command exiting 0 means healthy.
    Command { command: String },
    /// A log file containing `phrase` means healthy.
    LogContains { path: PathBuf, phrase: String },
}

/// Run a probe exactly once.
pub fn probe_once(probe: &HealthProbe, root: &Path, client: &reqwest::blocking::Client) -> bool {
    match probe {
        HealthProbe::Http { url } => match client.get(url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url, error = %e, "health ping failed");
                false
            }
        },
        HealthProbe::Ready { url } => match client.get(url).send() {
            Ok(resp) if resp.status().is_success() => resp
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(String::from))
                .is_some_and(|s| s == "ready"),
            Ok(resp) => {
                tracing::debug!(url, status = %resp.status(), "ready check failed");
                false
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "ready check failed");
                false
            }
        },
        HealthProbe::Command { command } => {
            process::run_shell(command, root, Some(PROBE_COMMAND_TIMEOUT)).success
        }
        HealthProbe::LogContains { path, phrase } => {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            match std::fs::read_to_string(&full) {
                Ok(data) => data.contains(phrase.as_str()),
                Err(e) => {
                    tracing::debug!(path = %full.display(), error = %e, "could not read log");
                    false
                }
            }
        }
    }
}

/// Poll `probe` at `interval` until it succeeds or `timeout` elapses.
/// Returns `true` on success, `false` on timeout — the caller decides how a
/// timeout is reported.
pub fn wait_healthy(
    probe: &HealthProbe,
    root: &Path,
    timeout: Duration,
    interval: Duration,
) -> bool {
    // A probe client must never run without its timeout.
    let client = reqwest::blocking::Client::builder()
        .timeout(PROBE_HTTP_TIMEOUT)
        .build()
        .expect("HTTP client with only a timeout set");

    let deadline = Instant::now() + timeout;
    loop {
        if probe_once(probe, root, &client) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
