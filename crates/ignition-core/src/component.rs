//! Component definitions and the ordered launch plan.

use crate::error::{IgnitionError, Result};
use crate::health::HealthProbe;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_health_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1000
}

/// One launchable component as declared in config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    /// Lower values launch first. Components with equal priority keep their
    /// declaration order.
    #[serde(default)]
    pub priority: i64,
    /// Shell command that starts the component.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthProbe>,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub health_poll_interval_ms: u64,
    /// Timeout for the start command itself. `None` waits for it to exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timeout_seconds: Option<u64>,
}

// ---------------------------------------------------------------------------
// RunPlan
// ---------------------------------------------------------------------------

/// Components sorted into launch order, with resume bookkeeping.
#[derive(Debug, Clone)]
pub struct RunPlan {
    components: Vec<ComponentSpec>,
}

impl RunPlan {
    /// Build a plan from declared components. Validates names, rejects
    /// duplicates, and sorts by priority (stable, so declaration order breaks
    /// ties).
    pub fn new(mut components: Vec<ComponentSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &components {
            paths::validate_name(&spec.name)?;
            if !seen.insert(spec.name.clone()) {
                return Err(IgnitionError::DuplicateComponent(spec.name.clone()));
            }
        }
        components.sort_by_key(|c| c.priority);
        Ok(Self { components })
    }

    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Index of the first component still to launch given a checkpoint.
    /// An empty or unrecognized checkpoint restarts the whole plan.
    pub fn resume_index(&self, last_component: &str) -> usize {
        if last_component.is_empty() {
            return 0;
        }
        match self
            .components
            .iter()
            .position(|c| c.name == last_component)
        {
            Some(i) => i + 1,
            None => {
                tracing::warn!(
                    last_component,
                    "checkpoint names an unknown component, starting from scratch"
                );
                0
            }
        }
    }

    /// True when the checkpoint already covers the entire plan.
    pub fn is_complete(&self, last_component: &str) -> bool {
        !self.components.is_empty() && self.resume_index(last_component) == self.components.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
