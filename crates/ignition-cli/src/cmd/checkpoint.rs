use crate::output::print_json;
use clap::Subcommand;
use ignition_core::checkpoint::{CheckpointStore, FileCheckpointStore};
use std::path::Path;

#[derive(Subcommand)]
pub enum CheckpointSubcommand {
    /// Show the last successfully launched component
    Show,

    /// Remove the checkpoint so the next run starts from scratch
    Clear,
}

pub fn run(root: &Path, subcmd: CheckpointSubcommand, json: bool) -> anyhow::Result<()> {
    let store = FileCheckpointStore::at_root(root);
    match subcmd {
        CheckpointSubcommand::Show => {
            let last = store.load();
            if json {
                print_json(&serde_json::json!({ "last_component": last }))?;
            } else if last.is_empty() {
                println!("No checkpoint — next run starts from the first component.");
            } else {
                println!("Last launched component: {last}");
            }
        }
        CheckpointSubcommand::Clear => {
            store.clear()?;
            if json {
                print_json(&serde_json::json!({ "cleared": true }))?;
            } else {
                println!("Checkpoint cleared.");
            }
        }
    }
    Ok(())
}
