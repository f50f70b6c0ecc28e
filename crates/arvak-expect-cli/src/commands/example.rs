//! Example command implementation.
//!
//! Prints a small batch file: a two-qubit variational ansatz at two
//! parameter points, plus an empty circuit.

use anyhow::{Context, Result};

use arvak_expect::{Param, PauliSum, PauliTerm, Program, StandardGate, SymbolMap};

use super::common::BatchFile;

fn ansatz() -> Program {
    Program::new(2)
        .with(StandardGate::Ry, vec![Param::symbol("theta")], vec![0])
        .with(StandardGate::Ry, vec![Param::symbol("phi")], vec![1])
        .with(StandardGate::CX, vec![], vec![0, 1])
        .with(
            StandardGate::Rz,
            vec![Param::Scaled {
                symbol: "theta".into(),
                factor: 0.5,
            }],
            vec![1],
        )
}

fn symbols(theta: f64, phi: f64) -> SymbolMap {
    [("theta".to_string(), theta), ("phi".to_string(), phi)]
        .into_iter()
        .collect()
}

/// Build the sample batch.
pub fn sample_batch() -> BatchFile {
    let energy = PauliSum::from_terms(vec![
        PauliTerm::zz(0, 1, -1.0),
        PauliTerm::x(0, 0.5),
        PauliTerm::x(1, 0.5),
    ]);
    let magnetization = PauliSum::from_terms(vec![PauliTerm::z(0, 0.5), PauliTerm::z(1, 0.5)]);

    BatchFile {
        programs: vec![ansatz(), ansatz(), Program::new(2)],
        symbols: vec![symbols(0.3, 1.1), symbols(1.2, -0.4), SymbolMap::default()],
        observables: vec![vec![energy, magnetization]; 3],
    }
}

/// Execute the example command.
pub fn execute(format: &str) -> Result<()> {
    let batch = sample_batch();
    let text = match format {
        "yaml" | "yml" => serde_yaml_ng::to_string(&batch).context("YAML serialization failed")?,
        "json" => serde_json::to_string_pretty(&batch).context("JSON serialization failed")?,
        other => anyhow::bail!("Unknown format '{other}'. Available: yaml, json"),
    };
    println!("{text}");
    Ok(())
}
