//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::{Deserialize, Serialize};

use arvak_expect::{
    BatchStats, Circuit, EngineConfig, PauliSum, Program, ResultMatrix, SymbolMap,
};

/// A batch description: one program, symbol map and observable list per
/// circuit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFile {
    /// Parameterized programs.
    pub programs: Vec<Program>,
    /// Symbol values, one map per program.
    #[serde(default)]
    pub symbols: Vec<SymbolMap>,
    /// Observables, one list per program.
    pub observables: Vec<Vec<PauliSum>>,
}

/// JSON report written by `run`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub results: &'a ResultMatrix,
    pub stats: &'a BatchStats,
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a batch from a JSON or YAML file.
pub fn load_batch(path: &str) -> Result<BatchFile> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let mut batch: BatchFile = match extension(path_obj).as_str() {
        "json" => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse batch JSON: {path}"))?,
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse batch YAML: {path}"))?,
        other => anyhow::bail!("Unsupported batch format '{other}'. Use .json, .yaml or .yml"),
    };

    // Programs without symbols may omit the map list entirely.
    if batch.symbols.is_empty() {
        batch.symbols = vec![SymbolMap::default(); batch.programs.len()];
    }
    Ok(batch)
}

/// Load the engine configuration, falling back to defaults.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load engine config: {path}")),
        None => Ok(EngineConfig::default()),
    }
}

/// Print a result matrix as a table, one row per circuit labelled by its id.
pub fn print_matrix(matrix: &ResultMatrix, circuits: &[Circuit]) {
    let cols = matrix.shape().1;
    let width = circuits
        .iter()
        .map(|c| c.id().0.len())
        .max()
        .unwrap_or(0)
        .max(12);

    print!("  {:<width$}", style("circuit").bold());
    for j in 0..cols {
        print!(" {:>12}", style(format!("O{j}")).bold());
    }
    println!();

    for (i, circuit) in circuits.iter().enumerate().take(matrix.shape().0) {
        print!("  {:<width$}", style(circuit.id().0.as_str()).cyan());
        for (j, value) in matrix.row(i).iter().enumerate() {
            if matrix.is_computed(i, j) {
                print!(" {value:>12.6}");
            } else {
                print!(" {:>12}", style("empty").dim());
            }
        }
        println!();
    }
}

/// Print batch counters.
pub fn print_stats(stats: &BatchStats) {
    println!(
        "\n  {} circuits ({} empty), {} observables, peak {} qubits",
        stats.circuits, stats.empty_circuits, stats.observables_evaluated, stats.peak_qubits
    );
    println!(
        "  Elapsed: {}",
        style(format!("{:.2?}", stats.elapsed)).yellow()
    );
}
