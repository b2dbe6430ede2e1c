use crate::output::print_json;
use anyhow::Context;
use ignition_core::{
    config::Config,
    repair::{attempt_repair, HttpRemediationProvider},
};
use std::path::Path;
use std::time::Duration;

pub fn run(
    root: &Path,
    module: &Path,
    tests: &[String],
    context: &str,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let provider_cfg = config
        .provider
        .as_ref()
        .context("no remediation provider configured; add a 'provider' section to the config")?;

    let provider = HttpRemediationProvider::new(
        provider_cfg.id.clone(),
        provider_cfg.address.clone(),
        Duration::from_secs(provider_cfg.timeout_seconds),
    );

    // Each test target gets the provider timeout as its own budget.
    let report = attempt_repair(
        root,
        module,
        &provider,
        tests,
        Some(Duration::from_secs(provider_cfg.timeout_seconds)),
        context,
    )?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Patched {} via '{}' — {} test target(s) passing.",
            report.module.display(),
            report.provider_id,
            report.test_results.len()
        );
    }
    Ok(())
}
