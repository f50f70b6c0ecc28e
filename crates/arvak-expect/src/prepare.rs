//! Parallel preparation of a batch of programs.
//!
//! Each program is resolved independently on the rayon pool. Results are
//! gathered per program and reduced in input order, so when several
//! programs fail the error of the earliest one is reported.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::circuit::Circuit;
use crate::config::FusionConfig;
use crate::error::{ExpectError, ExpectResult};
use crate::pauli::PauliSum;
use crate::program::{Program, SymbolMap};

/// Resolve `programs[i]` against `symbols[i]` for every `i`.
#[instrument(skip_all, fields(programs = programs.len()))]
pub fn prepare_batch(
    programs: &[Program],
    symbols: &[SymbolMap],
    fusion: &FusionConfig,
) -> ExpectResult<Vec<Circuit>> {
    if programs.len() != symbols.len() {
        return Err(ExpectError::BatchSizeMismatch {
            circuits: programs.len(),
            other: symbols.len(),
            what: "symbol values",
        });
    }

    let results: Vec<ExpectResult<Circuit>> = programs
        .par_iter()
        .zip(symbols.par_iter())
        .enumerate()
        .map(|(index, (program, symbols))| program.resolve(index, symbols, fusion))
        .collect();

    let circuits = results.into_iter().collect::<ExpectResult<Vec<_>>>()?;
    debug!(
        "Prepared {} circuits ({} fused gates)",
        circuits.len(),
        circuits.iter().map(|c| c.gates().len()).sum::<usize>()
    );
    Ok(circuits)
}

/// Check every observable's qubits against its circuit.
pub fn validate_observables(circuits: &[Circuit], observables: &[Vec<PauliSum>]) -> ExpectResult<()> {
    if circuits.len() != observables.len() {
        return Err(ExpectError::BatchSizeMismatch {
            circuits: circuits.len(),
            other: observables.len(),
            what: "observable lists",
        });
    }
    circuits
        .iter()
        .zip(observables)
        .try_for_each(|(circuit, sums)| {
            sums.iter()
                .try_for_each(|sum| sum.validate(circuit.num_qubits()))
        })
}
