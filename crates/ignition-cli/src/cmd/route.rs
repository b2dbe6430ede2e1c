use crate::output::print_json;
use anyhow::Context;
use ignition_core::{
    config::Config,
    router::{BackendKind, FallbackRouter, HttpPrimaryBackend, HttpSecondaryBackend},
};
use std::path::Path;
use std::time::Duration;

pub fn run(root: &Path, text: &str, context: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let router_cfg = config
        .router
        .as_ref()
        .context("no router configured; add a 'router' section to the config")?;

    let router = FallbackRouter::new(
        HttpPrimaryBackend::new(
            router_cfg.primary.url.clone(),
            Duration::from_secs(router_cfg.primary.timeout_seconds),
        ),
        HttpSecondaryBackend::new(
            router_cfg.secondary.url.clone(),
            Duration::from_secs(router_cfg.secondary.timeout_seconds),
        ),
    );

    let routed = router.route(text, context)?;

    if json {
        let value = serde_json::json!({
            "backend": routed.decision.backend,
            "latency_ms": routed.decision.latency_ms,
            "response": routed.response,
        });
        return print_json(&value);
    }

    println!("{}", routed.response.text);
    let backend = match routed.decision.backend {
        BackendKind::Primary => "primary",
        BackendKind::Secondary => "secondary",
    };
    eprintln!("[{backend}, {}ms]", routed.decision.latency_ms);
    Ok(())
}
