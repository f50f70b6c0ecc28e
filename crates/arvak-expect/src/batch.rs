//! Batched simulation and expectation evaluation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, trace};

use crate::apply::apply_sequence;
use crate::buffer::StateBuffers;
use crate::circuit::Circuit;
use crate::config::EngineConfig;
use crate::error::{ExpectError, ExpectResult};
use crate::expectation::ExpectationEvaluator;
use crate::pauli::PauliSum;

/// Value written for every observable of a circuit with no gates.
pub const EMPTY_CIRCUIT_SENTINEL: f32 = -2.0;

/// `rows × cols` expectation values, one row per circuit.
///
/// Cells of circuits without gates hold [`EMPTY_CIRCUIT_SENTINEL`] and are
/// flagged as not computed, so a genuine `-2.0` can be told apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
    computed: Vec<bool>,
}

impl ResultMatrix {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
            computed: vec![false; rows * cols],
        }
    }

    /// `(batch_size, observables_per_circuit)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value of cell `(row, col)`, sentinel included.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.rows && col < self.cols).then(|| self.values[row * self.cols + col])
    }

    /// Value of cell `(row, col)` if it was actually computed.
    pub fn computed(&self, row: usize, col: usize) -> Option<f32> {
        self.get(row, col)
            .filter(|_| self.computed[row * self.cols + col])
    }

    /// True if cell `(row, col)` holds a computed expectation value.
    pub fn is_computed(&self, row: usize, col: usize) -> bool {
        self.computed(row, col).is_some()
    }

    /// One circuit's values.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// All values, row-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Consume into nested rows.
    pub fn into_rows(self) -> Vec<Vec<f32>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.values
            .chunks(self.cols)
            .map(<[f32]>::to_vec)
            .collect()
    }
}

/// Counters collected while running a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Circuits in the batch.
    pub circuits: usize,
    /// Circuits whose cells hold the empty-circuit sentinel.
    pub empty_circuits: usize,
    /// Fused gates applied across the batch.
    pub gates_applied: usize,
    /// Observables evaluated.
    pub observables_evaluated: usize,
    /// Buffer reallocations across all devices.
    pub buffer_growths: usize,
    /// Widest circuit simulated.
    pub peak_qubits: u32,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl BatchStats {
    fn merge(&mut self, other: &BatchStats) {
        self.circuits += other.circuits;
        self.empty_circuits += other.empty_circuits;
        self.gates_applied += other.gates_applied;
        self.observables_evaluated += other.observables_evaluated;
        self.buffer_growths += other.buffer_growths;
        self.peak_qubits = self.peak_qubits.max(other.peak_qubits);
    }
}

/// Runs batches of circuits and evaluates their observables.
///
/// Each call owns its own state buffers for the duration of the call, so
/// one engine can serve concurrent batches.
#[derive(Debug, Clone)]
pub struct ExpectationEngine {
    config: EngineConfig,
    evaluator: ExpectationEvaluator,
}

impl Default for ExpectationEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            evaluator: ExpectationEvaluator::new(EngineConfig::default().imag_tolerance),
        }
    }
}

impl ExpectationEngine {
    /// Create an engine with a validated configuration.
    pub fn new(config: EngineConfig) -> ExpectResult<Self> {
        config.validate()?;
        let evaluator = ExpectationEvaluator::new(config.imag_tolerance);
        Ok(Self { config, evaluator })
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulate every circuit in order and evaluate its observables.
    ///
    /// Fails before any simulation if `observables` does not have one
    /// equally long list per circuit. No partial results are returned.
    pub fn run(&self, circuits: &[Circuit], observables: &[Vec<PauliSum>]) -> ExpectResult<ResultMatrix> {
        self.run_with_stats(circuits, observables)
            .map(|(matrix, _)| matrix)
    }

    /// [`run`](Self::run), also returning batch counters.
    #[instrument(skip_all, fields(circuits = circuits.len()))]
    pub fn run_with_stats(
        &self,
        circuits: &[Circuit],
        observables: &[Vec<PauliSum>],
    ) -> ExpectResult<(ResultMatrix, BatchStats)> {
        let start = Instant::now();
        let cols = check_batch_shape(circuits, observables)?;
        let mut matrix = ResultMatrix::new(circuits.len(), cols);

        let mut buffers = StateBuffers::new(self.config.max_qubits)?;
        let mut stats = self.simulate_rows(
            &mut buffers,
            circuits,
            observables,
            &mut matrix.values,
            &mut matrix.computed,
        )?;
        stats.elapsed = start.elapsed();

        debug!(
            "Batch completed in {:?}: {} circuits ({} empty), {} observables, peak {} qubits, {} buffer growths",
            stats.elapsed,
            stats.circuits,
            stats.empty_circuits,
            stats.observables_evaluated,
            stats.peak_qubits,
            stats.buffer_growths
        );
        Ok((matrix, stats))
    }

    /// Split the batch over `config.devices` independent buffer pairs.
    ///
    /// Circuits are divided into contiguous chunks, one per device, each
    /// processed sequentially with its own monotonically growing buffers.
    /// Rows keep input order; if several chunks fail, the error of the
    /// earliest chunk is returned.
    #[instrument(skip_all, fields(circuits = circuits.len(), devices = self.config.devices))]
    pub fn run_parallel(
        &self,
        circuits: &[Circuit],
        observables: &[Vec<PauliSum>],
    ) -> ExpectResult<(ResultMatrix, BatchStats)> {
        let start = Instant::now();
        let cols = check_batch_shape(circuits, observables)?;
        let devices = self.config.devices.min(circuits.len()).max(1);
        if devices == 1 || cols == 0 {
            return self.run_with_stats(circuits, observables);
        }
        let mut matrix = ResultMatrix::new(circuits.len(), cols);

        let chunk = circuits.len().div_ceil(devices);
        let cell_chunk = chunk * cols;
        let per_device: Vec<ExpectResult<BatchStats>> = circuits
            .par_chunks(chunk)
            .zip(observables.par_chunks(chunk))
            .zip(
                matrix
                    .values
                    .par_chunks_mut(cell_chunk)
                    .zip(matrix.computed.par_chunks_mut(cell_chunk)),
            )
            .enumerate()
            .map(|(device, ((circuits, observables), (values, computed)))| {
                trace!("Device {} handles {} circuits", device, circuits.len());
                let mut buffers = StateBuffers::new(self.config.max_qubits)?;
                self.simulate_rows(&mut buffers, circuits, observables, values, computed)
            })
            .collect();

        let mut stats = BatchStats::default();
        for result in per_device {
            stats.merge(&result?);
        }
        stats.elapsed = start.elapsed();

        debug!(
            "Parallel batch completed in {:?} on {} devices: {} circuits, peak {} qubits",
            stats.elapsed, devices, stats.circuits, stats.peak_qubits
        );
        Ok((matrix, stats))
    }

    /// Process `circuits` sequentially with one buffer pair, writing each
    /// circuit's row into `values`/`computed`.
    fn simulate_rows(
        &self,
        buffers: &mut StateBuffers,
        circuits: &[Circuit],
        observables: &[Vec<PauliSum>],
        values: &mut [f32],
        computed: &mut [bool],
    ) -> ExpectResult<BatchStats> {
        let mut stats = BatchStats {
            circuits: circuits.len(),
            ..BatchStats::default()
        };
        let growths_before = buffers.growths();

        for (i, (circuit, sums)) in circuits.iter().zip(observables).enumerate() {
            let nq = circuit.num_qubits();
            buffers.ensure_capacity(nq)?;
            buffers.reset_to_zero_state(nq);
            apply_sequence(circuit.gates(), buffers.primary_mut(nq));
            stats.gates_applied += circuit.gates().len();
            stats.peak_qubits = stats.peak_qubits.max(nq);

            let cols = sums.len();
            let row_values = &mut values[i * cols..(i + 1) * cols];
            let row_computed = &mut computed[i * cols..(i + 1) * cols];

            if circuit.is_empty() {
                trace!("Circuit {} has no gates; writing sentinel", circuit.id());
                row_values.fill(EMPTY_CIRCUIT_SENTINEL);
                stats.empty_circuits += 1;
                continue;
            }

            let (state, scratch) = buffers.split(nq);
            for ((sum, value), done) in sums.iter().zip(row_values).zip(row_computed) {
                debug_assert!(!*done, "result cell written twice");
                *value = self.evaluator.evaluate(sum, state, scratch);
                *done = true;
            }
            stats.observables_evaluated += cols;
            trace!(
                "Circuit {} ({} qubits, {} gates) evaluated",
                circuit.id(),
                nq,
                circuit.gates().len()
            );
        }

        stats.buffer_growths = buffers.growths() - growths_before;
        Ok(stats)
    }
}

/// Validate batch lengths and return the uniform observable count.
fn check_batch_shape(circuits: &[Circuit], observables: &[Vec<PauliSum>]) -> ExpectResult<usize> {
    if circuits.len() != observables.len() {
        return Err(ExpectError::BatchSizeMismatch {
            circuits: circuits.len(),
            other: observables.len(),
            what: "observable lists",
        });
    }
    let cols = observables.first().map_or(0, Vec::len);
    if let Some((index, sums)) = observables
        .iter()
        .enumerate()
        .find(|(_, sums)| sums.len() != cols)
    {
        return Err(ExpectError::ObservableCountMismatch {
            index,
            expected: cols,
            got: sums.len(),
        });
    }
    Ok(cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{FusedGate, GateSequence, StandardGate};
    use crate::pauli::PauliTerm;

    fn x_circuit(id: &str, num_qubits: u32, target: u32) -> Circuit {
        let gates: GateSequence = [FusedGate::from_standard(StandardGate::X, &[], &[target]).unwrap()]
            .into_iter()
            .collect();
        Circuit::new(id, num_qubits, gates).unwrap()
    }

    #[test]
    fn test_shape_mismatch_fails_first() {
        let engine = ExpectationEngine::default();
        let circuits = vec![x_circuit("a", 1, 0)];
        let err = engine.run(&circuits, &[]).unwrap_err();
        assert!(matches!(
            err,
            ExpectError::BatchSizeMismatch {
                circuits: 1,
                other: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_ragged_observables_rejected() {
        let engine = ExpectationEngine::default();
        let circuits = vec![x_circuit("a", 1, 0), x_circuit("b", 1, 0)];
        let z = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        let observables = vec![vec![z.clone(), z.clone()], vec![z]];
        assert!(matches!(
            engine.run(&circuits, &observables),
            Err(ExpectError::ObservableCountMismatch {
                index: 1,
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_sentinel_flagged_as_not_computed() {
        let engine = ExpectationEngine::default();
        let circuits = vec![Circuit::empty("e", 2).unwrap(), x_circuit("x", 2, 1)];
        let z1 = PauliSum::from_terms(vec![PauliTerm::z(1, 2.0)]);
        let observables = vec![vec![z1.clone()], vec![z1]];

        let (matrix, stats) = engine.run_with_stats(&circuits, &observables).unwrap();
        assert_eq!(matrix.get(0, 0), Some(EMPTY_CIRCUIT_SENTINEL));
        assert!(!matrix.is_computed(0, 0));
        // A genuine -2.0 is distinguishable from the sentinel.
        assert!((matrix.get(1, 0).unwrap() + 2.0).abs() < 1e-6);
        assert!(matrix.is_computed(1, 0));
        assert_eq!(stats.empty_circuits, 1);
        assert_eq!(stats.observables_evaluated, 1);
    }

    #[test]
    fn test_result_matrix_accessors() {
        let mut m = ResultMatrix::new(2, 3);
        m.values.copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.computed(0, 0), None);
        assert_eq!(m.into_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_zero_observables() {
        let engine = ExpectationEngine::default();
        let circuits = vec![x_circuit("a", 2, 0), x_circuit("b", 3, 2)];
        let matrix = engine.run(&circuits, &[vec![], vec![]]).unwrap();
        assert_eq!(matrix.shape(), (2, 0));
        assert_eq!(matrix.into_rows(), vec![Vec::<f32>::new(), Vec::new()]);
    }

    #[test]
    fn test_qubit_limit_aborts_batch() {
        let engine = ExpectationEngine::new(EngineConfig::default().with_max_qubits(3)).unwrap();
        let circuits = vec![x_circuit("small", 2, 0), x_circuit("big", 4, 3)];
        let z = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        let err = engine
            .run(&circuits, &[vec![z.clone()], vec![z]])
            .unwrap_err();
        assert!(matches!(err, ExpectError::QubitLimitExceeded { .. }));
    }
}
