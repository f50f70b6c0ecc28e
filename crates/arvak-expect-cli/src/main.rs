//! Arvak Expect Command-Line Interface
//!
//! Evaluates Pauli-sum expectation values for a batch of parameterized
//! circuits described in a JSON or YAML file.
//!
//! ```text
//! arvak-expect example > batch.yaml
//! arvak-expect run -i batch.yaml --devices 4
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{example, run};

/// Arvak Expect - batched expectation values of parameterized circuits
#[derive(Parser)]
#[command(name = "arvak-expect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a batch and evaluate its observables
    Run {
        /// Batch file (JSON or YAML)
        #[arg(short, long)]
        input: String,

        /// Engine configuration file (JSON or YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of devices to split the batch over
        #[arg(short, long, env = "ARVAK_EXPECT_DEVICES")]
        devices: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print a sample batch file
    Example {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Run {
            input,
            config,
            devices,
            format,
            output,
        } => run::execute(
            &input,
            config.as_deref(),
            devices,
            &format,
            output.as_deref(),
        ),

        Commands::Example { format } => example::execute(&format),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
