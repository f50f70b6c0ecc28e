//! Run command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use arvak_expect::{ExpectationEngine, prepare_batch, validate_observables};

use super::common::{RunReport, load_batch, load_config, print_matrix, print_stats};

/// Execute the run command.
pub fn execute(
    input: &str,
    config: Option<&str>,
    devices: Option<usize>,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    let json = match format {
        "json" => true,
        "table" => false,
        other => anyhow::bail!("Unknown format '{other}'. Available: table, json"),
    };

    let mut engine_config = load_config(config)?;
    if let Some(devices) = devices {
        engine_config.devices = devices;
    }
    let engine = ExpectationEngine::new(engine_config)?;

    if !json {
        println!(
            "{} Evaluating {} on {} device(s)",
            style("→").cyan().bold(),
            style(input).green(),
            style(engine.config().devices).yellow()
        );
    }

    let batch = load_batch(input)?;
    let circuits = prepare_batch(&batch.programs, &batch.symbols, &engine.config().fusion)
        .context("Failed to prepare circuits")?;
    validate_observables(&circuits, &batch.observables).context("Invalid observables")?;
    info!(
        "Prepared {} circuits, {} fused gates",
        circuits.len(),
        circuits.iter().map(|c| c.gates().len()).sum::<usize>()
    );

    let (matrix, stats) = if engine.config().devices > 1 {
        engine.run_parallel(&circuits, &batch.observables)?
    } else {
        engine.run_with_stats(&circuits, &batch.observables)?
    };

    let report = serde_json::to_string_pretty(&RunReport {
        results: &matrix,
        stats: &stats,
    })
    .context("JSON serialization failed")?;

    if json {
        println!("{report}");
    } else {
        println!(
            "\n{} {} × {} expectation values:",
            style("✓").green().bold(),
            matrix.shape().0,
            matrix.shape().1
        );
        print_matrix(&matrix, &circuits);
        print_stats(&stats);
    }

    if let Some(path) = output {
        fs::write(path, &report).with_context(|| format!("Failed to write output: {path}"))?;
        if !json {
            println!("\n  Report written to {}", style(path).green());
        }
    }

    Ok(())
}
