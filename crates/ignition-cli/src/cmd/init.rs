use anyhow::Context;
use ignition_core::{io, paths};
use std::path::Path;

const STARTER_CONFIG: &str = r#"version: 1

# Components launch in ascending priority order; ties keep declaration order.
components:
  - name: example-service
    priority: 1
    command: ./scripts/start-example.sh
    # health_check:
    #   type: http
    #   url: http://localhost:8000/healthz
    health_timeout_seconds: 30

launch:
  retries: 3
  skip_on_failure: false

# provider:
#   id: opencode
#   address: http://localhost:9100/patch

# router:
#   primary:
#     url: http://localhost:9200/decide
#   secondary:
#     url: http://localhost:9300/v1/complete

# servants:
#   - name: deepseek
#     address: http://localhost:9400
#     env: DEEPSEEK_URL
"#;

pub fn run(root: &Path) -> anyhow::Result<()> {
    io::ensure_dir(&paths::ignition_dir(root)).context("failed to create .ignition directory")?;

    let written = io::write_if_missing(&paths::config_path(root), STARTER_CONFIG.as_bytes())
        .context("failed to write config")?;

    if written {
        println!("Initialized {}", paths::CONFIG_FILE);
        println!("Edit the component list, then run 'ignite run'.");
    } else {
        println!("{} already exists, leaving it alone.", paths::CONFIG_FILE);
    }
    Ok(())
}
