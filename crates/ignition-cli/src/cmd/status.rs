use crate::output::{print_json, print_table};
use anyhow::Context;
use ignition_core::{
    checkpoint::{CheckpointStore, FileCheckpointStore},
    component::RunPlan,
    config::Config,
    history::History,
    paths,
    servants::parse_endpoints,
};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let plan = RunPlan::new(config.components.clone()).context("invalid component list")?;
    let last = FileCheckpointStore::at_root(root).load();
    let history = History::load(root);
    let resume = plan.resume_index(&last);

    let endpoints = std::fs::read_to_string(paths::endpoints_path(root))
        .map(|data| parse_endpoints(&data))
        .unwrap_or_default();

    if json {
        let value = serde_json::json!({
            "checkpoint": last,
            "complete": plan.is_complete(&last),
            "components": plan
                .components()
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    serde_json::json!({
                        "name": c.name,
                        "priority": c.priority,
                        "launched": i < resume,
                        "health_check": c.health_check.is_some(),
                    })
                })
                .collect::<Vec<_>>(),
            "servant_endpoints": endpoints,
            "runs": history.runs.len(),
            "best_sequence": history.best_sequence,
        });
        return print_json(&value);
    }

    if last.is_empty() {
        println!("Checkpoint: (none)");
    } else {
        println!("Checkpoint: {last}");
    }
    println!();

    let rows = plan
        .components()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            vec![
                c.name.clone(),
                c.priority.to_string(),
                if i < resume { "yes" } else { "no" }.to_string(),
                if c.health_check.is_some() { "yes" } else { "-" }.to_string(),
            ]
        })
        .collect();
    print_table(&["component", "priority", "launched", "probe"], rows);

    if !endpoints.is_empty() {
        println!();
        println!("Servant endpoints:");
        let mut names: Vec<_> = endpoints.keys().collect();
        names.sort();
        for name in names {
            println!("  {name} = {}", endpoints[name]);
        }
    }

    if let Some(best) = &history.best_sequence {
        println!();
        println!(
            "Best of {} run(s): {:.0}% healthy in {}ms",
            history.runs.len(),
            best.success_rate * 100.0,
            best.total_ms
        );
    }
    Ok(())
}
