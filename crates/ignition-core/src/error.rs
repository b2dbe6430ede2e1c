use thiserror::Error;

#[derive(Debug, Error)]
pub enum IgnitionError {
    #[error("checkpoint persistence failed: {0}")]
    Persistence(String),

    #[error("component '{component}' failed to start: {detail}")]
    StartupFailure { component: String, detail: String },

    #[error("health check for '{component}' did not succeed within {timeout_seconds}s")]
    HealthTimeout {
        component: String,
        timeout_seconds: u64,
    },

    #[error("remediation provider '{provider}' unreachable: {detail}")]
    ProviderUnavailable { provider: String, detail: String },

    #[error("remediation provider '{provider}' offered no usable candidate")]
    ProviderRejected { provider: String },

    #[error("candidate for '{module}' failed validation: {detail}")]
    ValidationFailed { module: String, detail: String },

    #[error("could not restore original content of '{module}': {detail} — manual intervention required")]
    RestoreFailed { module: String, detail: String },

    #[error("all backends unavailable — primary: {primary}; secondary: {secondary}")]
    RoutingExhausted { primary: String, secondary: String },

    #[error("invalid component name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    #[error("duplicate component '{0}' in run plan")]
    DuplicateComponent(String),

    #[error("no project configuration found: run 'ignite init' or pass --root")]
    ConfigNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IgnitionError {
    /// A `RestoreFailed` leaves the working tree in an unknown state; no
    /// further automated action may run after one is observed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IgnitionError::RestoreFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, IgnitionError>;
