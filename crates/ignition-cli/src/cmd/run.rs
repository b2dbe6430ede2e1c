use crate::output::print_json;
use anyhow::Context;
use ignition_core::{
    checkpoint::{CheckpointStore, FileCheckpointStore},
    component::RunPlan,
    config::Config,
    history::{History, RunRecord},
    sequencer::{HaltReason, LaunchSequencer, SequenceReport},
    servants::ServantRegistry,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// RunExit — typed non-zero exit codes (no std::process::exit in library code)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RunExit {
    StartupFailed { component: String, detail: String },
    HealthTimeout { component: String, timeout_seconds: u64 },
}

impl RunExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunExit::StartupFailed { .. } => 2,
            RunExit::HealthTimeout { .. } => 3,
        }
    }
}

impl std::fmt::Display for RunExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunExit::StartupFailed { component, detail } => {
                write!(f, "component '{component}' failed to start: {detail}")
            }
            RunExit::HealthTimeout {
                component,
                timeout_seconds,
            } => {
                write!(
                    f,
                    "component '{component}' not healthy after {timeout_seconds}s"
                )
            }
        }
    }
}

impl std::error::Error for RunExit {}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(root: &Path, fresh: bool, skip_on_failure: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let plan = RunPlan::new(config.components.clone()).context("invalid component list")?;
    if plan.is_empty() {
        anyhow::bail!("no components configured; edit {}", ignition_core::paths::CONFIG_FILE);
    }

    let store = FileCheckpointStore::at_root(root);
    if fresh {
        store.clear().context("failed to clear checkpoint")?;
    }

    // Servant endpoints are published before anything launches so early
    // components can read them.
    let registry = ServantRegistry::resolve(&config.servants);
    if !registry.endpoints().is_empty() {
        registry
            .write_endpoints(root)
            .context("failed to write servant endpoints")?;
    }

    let mut launch = config.launch.clone();
    if skip_on_failure {
        launch.skip_on_failure = true;
    }

    let sequencer = LaunchSequencer::new(root, plan, launch, store);
    let report = sequencer.run()?;

    if !report.already_complete {
        let mut history = History::load(root);
        history.record(RunRecord::new(report.component_runs(), report.total_ms));
        history.save(root).context("failed to save run history")?;
    }

    if json {
        print_json(&report_json(&report))?;
    } else {
        print_report(&report);
    }

    if let Some(halt) = report.halted {
        let exit = match halt.reason {
            HaltReason::Startup { detail } => RunExit::StartupFailed {
                component: halt.component,
                detail,
            },
            HaltReason::HealthTimeout { timeout_seconds } => RunExit::HealthTimeout {
                component: halt.component,
                timeout_seconds,
            },
        };
        return Err(exit.into());
    }
    Ok(())
}

fn print_report(report: &SequenceReport) {
    if report.already_complete {
        println!("All components already launched — nothing to do.");
        println!("Run 'ignite run --fresh' to start from scratch.");
        return;
    }
    for outcome in &report.outcomes {
        let status = if outcome.success {
            "ok"
        } else if outcome.skipped {
            "skipped"
        } else {
            "failed"
        };
        println!(
            "{:<10} {} ({} attempt{}, {}ms)",
            status,
            outcome.name,
            outcome.attempts,
            if outcome.attempts == 1 { "" } else { "s" },
            outcome.duration_ms
        );
    }
    if report.success() {
        println!("Launch complete in {}ms.", report.total_ms);
    }
}

fn report_json(report: &SequenceReport) -> serde_json::Value {
    serde_json::json!({
        "already_complete": report.already_complete,
        "success": report.success(),
        "total_ms": report.total_ms,
        "components": report
            .outcomes
            .iter()
            .map(|o| {
                serde_json::json!({
                    "name": o.name,
                    "success": o.success,
                    "skipped": o.skipped,
                    "attempts": o.attempts,
                    "duration_ms": o.duration_ms,
                    "detail": o.detail,
                })
            })
            .collect::<Vec<_>>(),
        "halted": report.halted.as_ref().map(|h| {
            serde_json::json!({
                "component": h.component,
                "reason": match &h.reason {
                    HaltReason::Startup { detail } => {
                        serde_json::json!({"kind": "startup_failure", "detail": detail})
                    }
                    HaltReason::HealthTimeout { timeout_seconds } => {
                        serde_json::json!({"kind": "health_timeout", "timeout_seconds": timeout_seconds})
                    }
                },
            })
        }),
    })
}
