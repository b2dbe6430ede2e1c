//! Health-gated launch sequencer.
//!
//! Components launch one at a time in priority order. A component only
//! counts as started once its health probe passes, and only then does the
//! checkpoint advance — so a crash mid-sequence resumes at the first
//! component that never became healthy.

use crate::checkpoint::CheckpointStore;
use crate::component::RunPlan;
use crate::config::LaunchConfig;
use crate::health;
use crate::history::ComponentRun;
use crate::process;
use std::path::PathBuf;
use std::time::Duration;

/// Cap on exponential retry backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ... capped at 60s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(6);
    Duration::from_secs(1u64 << exp).min(MAX_BACKOFF)
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ComponentOutcome {
    pub name: String,
    pub attempts: u32,
    pub success: bool,
    /// Failed but the sequence moved on (`skip_on_failure`).
    pub skipped: bool,
    /// The final attempt started but its health probe never passed.
    pub health_timed_out: bool,
    pub duration_ms: u64,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub enum HaltReason {
    /// Start command failed or timed out on every attempt.
    Startup { detail: String },
    /// Started, but the health probe never passed.
    HealthTimeout { timeout_seconds: u64 },
}

#[derive(Debug, Clone)]
pub struct SequenceHalt {
    pub component: String,
    pub reason: HaltReason,
}

impl SequenceHalt {
    pub fn to_error(&self) -> crate::IgnitionError {
        match &self.reason {
            HaltReason::Startup { detail } => crate::IgnitionError::StartupFailure {
                component: self.component.clone(),
                detail: detail.clone(),
            },
            HaltReason::HealthTimeout { timeout_seconds } => crate::IgnitionError::HealthTimeout {
                component: self.component.clone(),
                timeout_seconds: *timeout_seconds,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub outcomes: Vec<ComponentOutcome>,
    pub halted: Option<SequenceHalt>,
    /// The checkpoint already covered the full plan; nothing launched.
    pub already_complete: bool,
    pub total_ms: u64,
}

impl SequenceReport {
    pub fn success(&self) -> bool {
        self.halted.is_none()
    }

    pub fn component_runs(&self) -> Vec<ComponentRun> {
        self.outcomes
            .iter()
            .map(|o| ComponentRun {
                name: o.name.clone(),
                attempts: o.attempts,
                success: o.success,
                duration_ms: o.duration_ms,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LaunchSequencer
// ---------------------------------------------------------------------------

pub struct LaunchSequencer<S: CheckpointStore> {
    root: PathBuf,
    plan: RunPlan,
    launch: LaunchConfig,
    store: S,
}

impl<S: CheckpointStore> LaunchSequencer<S> {
    pub fn new(root: impl Into<PathBuf>, plan: RunPlan, launch: LaunchConfig, store: S) -> Self {
        Self {
            root: root.into(),
            plan,
            launch,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the plan from wherever the checkpoint left off.
    pub fn run(&self) -> crate::Result<SequenceReport> {
        let start = std::time::Instant::now();
        let last = self.store.load();

        if self.plan.is_complete(&last) {
            tracing::info!(last_component = %last, "all components already launched");
            return Ok(SequenceReport {
                outcomes: Vec::new(),
                halted: None,
                already_complete: true,
                total_ms: start.elapsed().as_millis() as u64,
            });
        }

        let from = self.plan.resume_index(&last);
        if from > 0 {
            tracing::info!(last_component = %last, resume_at = from, "resuming from checkpoint");
        }

        let mut outcomes = Vec::new();
        let mut halted = None;

        for spec in &self.plan.components()[from..] {
            let outcome = self.launch_component(spec);

            if outcome.success {
                self.store.save(&spec.name)?;
                outcomes.push(outcome);
                continue;
            }

            if self.launch.skip_on_failure {
                tracing::warn!(component = %spec.name, "component failed, skipping");
                outcomes.push(outcome);
                continue;
            }

            let reason = if outcome.health_timed_out {
                HaltReason::HealthTimeout {
                    timeout_seconds: spec.health_timeout_seconds,
                }
            } else {
                HaltReason::Startup {
                    detail: outcome.detail.clone(),
                }
            };
            halted = Some(SequenceHalt {
                component: spec.name.clone(),
                reason,
            });
            outcomes.push(outcome);
            break;
        }

        Ok(SequenceReport {
            outcomes,
            halted,
            already_complete: false,
            total_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Start one component with retries. Each attempt runs the start command
    /// and then waits for the health probe; either failing counts as a failed
    /// attempt.
    fn launch_component(&self, spec: &crate::component::ComponentSpec) -> ComponentOutcome {
        let start = std::time::Instant::now();
        let retries = self.launch.retries.max(1);
        let mut detail = String::new();
        let mut health_timed_out = false;

        for attempt in 1..=retries {
            if attempt > 1 {
                let delay = backoff_delay(attempt - 1);
                tracing::info!(component = %spec.name, attempt, delay_s = delay.as_secs(), "retrying");
                std::thread::sleep(delay);
            }

            tracing::info!(component = %spec.name, attempt, "starting");
            let outcome = process::run_shell(
                &spec.command,
                &self.root,
                spec.start_timeout_seconds.map(Duration::from_secs),
            );
            if !outcome.success {
                detail = if outcome.output.is_empty() {
                    "start command failed".to_string()
                } else {
                    outcome.output
                };
                health_timed_out = false;
                tracing::warn!(component = %spec.name, attempt, "start command failed");
                continue;
            }

            if let Some(probe) = &spec.health_check {
                let healthy = health::wait_healthy(
                    probe,
                    &self.root,
                    Duration::from_secs(spec.health_timeout_seconds),
                    Duration::from_millis(spec.health_poll_interval_ms),
                );
                if !healthy {
                    detail = format!(
                        "health probe not passing after {}s",
                        spec.health_timeout_seconds
                    );
                    health_timed_out = true;
                    tracing::warn!(component = %spec.name, attempt, "health probe timed out");
                    continue;
                }
            }

            tracing::info!(component = %spec.name, attempt, "healthy");
            return ComponentOutcome {
                name: spec.name.clone(),
                attempts: attempt,
                success: true,
                skipped: false,
                health_timed_out: false,
                duration_ms: start.elapsed().as_millis() as u64,
                detail: String::new(),
            };
        }

        ComponentOutcome {
            name: spec.name.clone(),
            attempts: retries,
            success: false,
            skipped: self.launch.skip_on_failure,
            health_timed_out,
            duration_ms: start.elapsed().as_millis() as u64,
            detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
