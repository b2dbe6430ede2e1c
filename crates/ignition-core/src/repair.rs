//! Self-healing patch loop.
//!
//! A remediation provider proposes replacement content for a failing module.
//! The candidate is written in place, the module's test targets run against
//! it, and the change either commits (all targets pass) or the original
//! bytes come back exactly as they were. The working tree is never left
//! holding an unvalidated candidate.

use crate::error::{IgnitionError, Result};
use crate::io;
use crate::process;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// What the provider is asked to fix.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRequest {
    pub module: String,
    pub failing_tests: Vec<String>,
    pub context: String,
}

/// Source of candidate patches. Injected so the loop can be tested without
/// a live service.
pub trait RemediationProvider {
    fn id(&self) -> &str;

    /// Fetch replacement content for the module. `ProviderUnavailable` means
    /// the provider could not be reached or answered abnormally;
    /// `ProviderRejected` means it answered but offered no candidate.
    fn fetch_candidate(&self, request: &CandidateRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct CandidateResponse {
    #[serde(default)]
    candidate: Option<String>,
}

/// Provider speaking JSON over HTTP: POST the request, read back
/// `{"candidate": "..."}`.
pub struct HttpRemediationProvider {
    id: String,
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpRemediationProvider {
    pub fn new(id: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .expect("HTTP client with only a timeout set"),
        }
    }
}

impl RemediationProvider for HttpRemediationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch_candidate(&self, request: &CandidateRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| IgnitionError::ProviderUnavailable {
                provider: self.id.clone(),
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(IgnitionError::ProviderUnavailable {
                provider: self.id.clone(),
                detail: format!("status {}", response.status()),
            });
        }

        let body: CandidateResponse =
            response
                .json()
                .map_err(|e| IgnitionError::ProviderUnavailable {
                    provider: self.id.clone(),
                    detail: format!("malformed response: {e}"),
                })?;

        match body.candidate {
            Some(candidate) if !candidate.is_empty() => Ok(candidate),
            _ => Err(IgnitionError::ProviderRejected {
                provider: self.id.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RestoreGuard
// ---------------------------------------------------------------------------

/// Holds the original bytes of a patched file until the candidate is either
/// committed or rolled back. The `Drop` impl is a backstop: if the loop
/// unwinds with the guard still armed, the original comes back anyway.
struct RestoreGuard {
    path: PathBuf,
    original: Vec<u8>,
    armed: bool,
}

impl RestoreGuard {
    fn arm(path: PathBuf, original: Vec<u8>) -> Self {
        Self {
            path,
            original,
            armed: true,
        }
    }

    fn commit(mut self) {
        self.armed = false;
    }

    /// Put the original bytes back and verify them. Disarms on success.
    fn restore(&mut self) -> std::result::Result<(), String> {
        io::atomic_write(&self.path, &self.original).map_err(|e| e.to_string())?;
        let written = std::fs::read(&self.path).map_err(|e| e.to_string())?;
        if written != self.original {
            return Err("restored content does not match original".to_string());
        }
        self.armed = false;
        Ok(())
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.restore() {
                tracing::error!(path = %self.path.display(), error = %e, "failed to restore original file");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Patch loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub target: String,
    pub duration_ms: u64,
}

/// Record of a committed patch.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub module: PathBuf,
    pub provider_id: String,
    pub test_results: Vec<TestResult>,
}

/// Fetch a candidate for `module`, validate it against `test_targets`, and
/// commit or roll back.
///
/// Test targets run via the shell from `root`, in order, stopping at the
/// first failure. If the provider fails the module is never touched.
pub fn attempt_repair(
    root: &Path,
    module: &Path,
    provider: &dyn RemediationProvider,
    test_targets: &[String],
    test_timeout: Option<Duration>,
    context: &str,
) -> Result<PatchReport> {
    let module_path = if module.is_absolute() {
        module.to_path_buf()
    } else {
        root.join(module)
    };
    let module_label = module.display().to_string();

    let original = std::fs::read(&module_path)?;

    let request = CandidateRequest {
        module: module_label.clone(),
        failing_tests: test_targets.to_vec(),
        context: context.to_string(),
    };
    tracing::info!(module = %module_label, provider = provider.id(), "requesting candidate");
    let candidate = provider.fetch_candidate(&request)?;

    io::atomic_write(&module_path, candidate.as_bytes())?;
    let mut guard = RestoreGuard::arm(module_path.clone(), original);

    let mut test_results = Vec::new();
    for target in test_targets {
        tracing::info!(module = %module_label, target, "validating candidate");
        let outcome = process::run_shell(target, root, test_timeout);
        if !outcome.success {
            tracing::warn!(module = %module_label, target, "validation failed, rolling back");
            if let Err(detail) = guard.restore() {
                return Err(IgnitionError::RestoreFailed {
                    module: module_label,
                    detail,
                });
            }
            return Err(IgnitionError::ValidationFailed {
                module: module_label,
                detail: format!("'{target}': {}", outcome.output),
            });
        }
        test_results.push(TestResult {
            target: target.clone(),
            duration_ms: outcome.duration_ms,
        });
    }

    guard.commit();
    tracing::info!(module = %module_label, provider = provider.id(), "candidate committed");
    Ok(PatchReport {
        module: module_path,
        provider_id: provider.id().to_string(),
        test_results,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
