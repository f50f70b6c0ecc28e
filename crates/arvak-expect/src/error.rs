//! Error types for the expectation crate.

use thiserror::Error;

/// Errors produced by circuit preparation and batched expectation evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExpectError {
    /// Number of circuits and number of per-circuit inputs differ.
    #[error("Number of circuits and {what} do not match. Got {circuits} circuits and {other} {what}")]
    BatchSizeMismatch {
        /// Number of circuits in the batch.
        circuits: usize,
        /// Length of the other batch input.
        other: usize,
        /// Name of the other batch input.
        what: &'static str,
    },

    /// Observable lists are not padded to a uniform length.
    #[error("Circuit {index} has {got} observables, expected {expected}")]
    ObservableCountMismatch {
        /// Row of the offending circuit.
        index: usize,
        /// Uniform observable count (taken from the first circuit).
        expected: usize,
        /// Observable count of this circuit.
        got: usize,
    },

    /// The state buffers could not be grown.
    #[error("Failed to allocate state buffers for {num_qubits} qubits ({bytes} bytes)")]
    Allocation {
        /// Requested qubit count.
        num_qubits: u32,
        /// Total bytes requested for primary and scratch buffers.
        bytes: usize,
    },

    /// A circuit is larger than the engine allows.
    #[error("Circuit has {num_qubits} qubits but the engine supports at most {max_qubits}")]
    QubitLimitExceeded {
        /// Requested qubit count.
        num_qubits: u32,
        /// Configured limit.
        max_qubits: u32,
    },

    /// A gate operation is malformed.
    #[error("Invalid gate '{gate}': {reason}")]
    InvalidGate {
        /// Gate name.
        gate: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An operation or Pauli term references a qubit outside the circuit.
    #[error("Qubit {qubit} is out of range for a {num_qubits}-qubit circuit")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: u32,
        /// Number of qubits in the circuit.
        num_qubits: u32,
    },

    /// A symbolic parameter has no value in the symbol map.
    #[error("Parameter '{0}' is unbound")]
    UnboundSymbol(String),

    /// A gate received the wrong number of parameters.
    #[error("Gate '{gate}' takes {expected} parameters, got {got}")]
    ParameterCount {
        /// Gate name.
        gate: &'static str,
        /// Expected parameter count.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },

    /// A Pauli sum is malformed.
    #[error("Invalid observable: {0}")]
    InvalidObservable(String),

    /// Circuit-level structural problem.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Engine configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for expectation operations.
pub type ExpectResult<T> = Result<T, ExpectError>;
