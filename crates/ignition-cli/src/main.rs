mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::checkpoint::CheckpointSubcommand;
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ignite",
    about = "Health-gated boot orchestrator — launch components in order, resume from checkpoints, self-heal failing modules",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .ignition/ or .git/)
    #[arg(long, global = true, env = "IGNITION_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold .ignition/ with a starter config
    Init,

    /// Launch all components, resuming from the checkpoint
    Run {
        /// Clear the checkpoint first and start from scratch
        #[arg(long)]
        fresh: bool,

        /// Continue past failed components instead of halting
        #[arg(long)]
        skip_on_failure: bool,
    },

    /// Show checkpoint, launch plan, and run history
    Status,

    /// Inspect or clear the launch checkpoint
    Checkpoint {
        #[command(subcommand)]
        subcommand: CheckpointSubcommand,
    },

    /// Fetch a candidate fix for a failing module and validate it
    Repair {
        /// Module file to repair (relative to the project root)
        #[arg(long)]
        module: PathBuf,

        /// Test command that must pass (repeatable, runs in order)
        #[arg(long = "test", required = true)]
        tests: Vec<String>,

        /// Extra context passed to the remediation provider
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Route a decision query through the primary/secondary backends
    Route {
        /// Query text
        text: String,

        /// Optional context string
        #[arg(long)]
        context: Option<String>,
    },

    /// Validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Run {
            fresh,
            skip_on_failure,
        } => cmd::run::run(&root, fresh, skip_on_failure, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Checkpoint { subcommand } => cmd::checkpoint::run(&root, subcommand, cli.json),
        Commands::Repair {
            module,
            tests,
            context,
        } => cmd::repair::run(&root, &module, &tests, &context, cli.json),
        Commands::Route { text, context } => {
            cmd::route::run(&root, &text, context.as_deref(), cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Typed exits keep their codes; everything else is a generic failure.
        if let Some(exit) = e.downcast_ref::<cmd::run::RunExit>() {
            eprintln!("error: {exit}");
            std::process::exit(exit.exit_code());
        }
        // A failed restore means the working tree can no longer be trusted;
        // it gets its own exit code so supervisors stop automating.
        if let Some(core) = e.downcast_ref::<ignition_core::IgnitionError>() {
            if core.is_fatal() {
                eprintln!("fatal: {core}");
                std::process::exit(4);
            }
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
