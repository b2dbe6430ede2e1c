//! Fallback decision router.
//!
//! Requests go to the primary backend first. Only unavailability — a closed
//! set of transport-level categories, never the content of an answer —
//! sends the same request to the secondary, whose raw reply is normalized
//! into the primary's response shape. Each backend is tried exactly once
//! per call.

use crate::error::IgnitionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// The primary backend's response shape; secondary replies are mapped into
/// it before reaching the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Application-level rejection. A rejection is a valid answer and never
    /// triggers fallback.
    #[serde(default)]
    pub rejected: bool,
}

#[derive(Debug, Clone)]
pub struct BackendReply {
    pub response: DecisionResponse,
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Unavailability classification
// ---------------------------------------------------------------------------

/// The only conditions that count as "backend unavailable". Anything outside
/// this set is returned to the caller as the backend's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableCategory {
    /// Connection refused, DNS failure, or no route.
    Connect,
    /// The request timed out.
    Timeout,
    /// 502 / 503 / 504 from a gateway in front of the backend.
    GatewayDown,
    /// The backend answered but not in its own protocol.
    MalformedResponse,
}

impl UnavailableCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::GatewayDown => "gateway_down",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendUnavailable {
    pub category: UnavailableCategory,
    pub detail: String,
}

impl std::fmt::Display for BackendUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category.as_str(), self.detail)
    }
}

fn classify_transport(err: &reqwest::Error) -> Option<UnavailableCategory> {
    if err.is_timeout() {
        Some(UnavailableCategory::Timeout)
    } else if err.is_connect() || err.is_request() {
        Some(UnavailableCategory::Connect)
    } else {
        None
    }
}

fn classify_status(status: reqwest::StatusCode) -> Option<UnavailableCategory> {
    match status.as_u16() {
        502 | 503 | 504 => Some(UnavailableCategory::GatewayDown),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

pub trait DecisionBackend {
    fn name(&self) -> &str;

    fn query(&self, request: &QueryRequest) -> Result<BackendReply, BackendUnavailable>;
}

/// Primary backend: speaks the decision protocol natively.
pub struct HttpPrimaryBackend {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpPrimaryBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .expect("HTTP client with only a timeout set"),
        }
    }
}

impl DecisionBackend for HttpPrimaryBackend {
    fn name(&self) -> &str {
        "primary"
    }

    fn query(&self, request: &QueryRequest) -> Result<BackendReply, BackendUnavailable> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| BackendUnavailable {
                category: classify_transport(&e).unwrap_or(UnavailableCategory::Connect),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if let Some(category) = classify_status(status) {
            return Err(BackendUnavailable {
                category,
                detail: format!("status {status}"),
            });
        }

        let raw = response.text().map_err(|e| BackendUnavailable {
            category: UnavailableCategory::MalformedResponse,
            detail: e.to_string(),
        })?;
        let parsed: DecisionResponse =
            serde_json::from_str(&raw).map_err(|e| BackendUnavailable {
                category: UnavailableCategory::MalformedResponse,
                detail: e.to_string(),
            })?;
        Ok(BackendReply {
            response: parsed,
            raw,
        })
    }
}

/// Secondary backend: any completion-style service. Its reply is normalized
/// into the primary shape — a JSON body with a string `text` field yields
/// that field, anything else yields the raw body.
pub struct HttpSecondaryBackend {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSecondaryBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .expect("HTTP client with only a timeout set"),
        }
    }
}

impl DecisionBackend for HttpSecondaryBackend {
    fn name(&self) -> &str {
        "secondary"
    }

    fn query(&self, request: &QueryRequest) -> Result<BackendReply, BackendUnavailable> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| BackendUnavailable {
                category: classify_transport(&e).unwrap_or(UnavailableCategory::Connect),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if let Some(category) = classify_status(status) {
            return Err(BackendUnavailable {
                category,
                detail: format!("status {status}"),
            });
        }

        let raw = response.text().map_err(|e| BackendUnavailable {
            category: UnavailableCategory::MalformedResponse,
            detail: e.to_string(),
        })?;
        let text = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get("text").and_then(|t| t.as_str()).map(String::from))
            .unwrap_or_else(|| raw.clone());
        Ok(BackendReply {
            response: DecisionResponse {
                text,
                model: None,
                rejected: false,
            },
            raw,
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Primary,
    Secondary,
}

/// Which backend answered, and how.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub backend: BackendKind,
    pub latency_ms: u64,
    pub raw_response: String,
}

#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub response: DecisionResponse,
    pub decision: RouteDecision,
}

pub struct FallbackRouter<P, S> {
    primary: P,
    secondary: S,
}

impl<P: DecisionBackend, S: DecisionBackend> FallbackRouter<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    /// Route one request. The primary is tried once; only unavailability
    /// reaches the secondary, which is also tried once.
    pub fn route(&self, text: &str, context: Option<&str>) -> crate::Result<RoutedResponse> {
        let request = QueryRequest {
            text: text.to_string(),
            context: context.map(String::from),
        };

        let start = std::time::Instant::now();
        let primary_failure = match self.primary.query(&request) {
            Ok(reply) => {
                return Ok(RoutedResponse {
                    response: reply.response,
                    decision: RouteDecision {
                        backend: BackendKind::Primary,
                        latency_ms: start.elapsed().as_millis() as u64,
                        raw_response: reply.raw,
                    },
                });
            }
            Err(unavailable) => {
                tracing::warn!(
                    backend = self.primary.name(),
                    category = unavailable.category.as_str(),
                    "primary unavailable, falling back"
                );
                unavailable
            }
        };

        let start = std::time::Instant::now();
        match self.secondary.query(&request) {
            Ok(reply) => Ok(RoutedResponse {
                response: reply.response,
                decision: RouteDecision {
                    backend: BackendKind::Secondary,
                    latency_ms: start.elapsed().as_millis() as u64,
                    raw_response: reply.raw,
                },
            }),
            Err(secondary_failure) => {
                tracing::error!(
                    primary = %primary_failure,
                    secondary = %secondary_failure,
                    "both backends unavailable"
                );
                Err(IgnitionError::RoutingExhausted {
                    primary: primary_failure.to_string(),
                    secondary: secondary_failure.to_string(),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
