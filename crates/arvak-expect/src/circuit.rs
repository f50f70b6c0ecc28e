//! Resolved circuits ready for simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExpectError, ExpectResult};
use crate::gate::GateSequence;

/// Opaque identifier of a circuit within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircuitId(pub String);

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CircuitId {
    fn from(id: &str) -> Self {
        CircuitId(id.to_string())
    }
}

impl From<String> for CircuitId {
    fn from(id: String) -> Self {
        CircuitId(id)
    }
}

impl From<usize> for CircuitId {
    fn from(index: usize) -> Self {
        CircuitId(format!("circuit_{index}"))
    }
}

/// A qubit count plus the fused, parameter-bound gates to apply to |0…0⟩.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    id: CircuitId,
    num_qubits: u32,
    gates: GateSequence,
}

impl Circuit {
    /// Create a circuit, checking that every gate fits in `num_qubits`.
    pub fn new(id: impl Into<CircuitId>, num_qubits: u32, gates: GateSequence) -> ExpectResult<Self> {
        if num_qubits == 0 {
            return Err(ExpectError::InvalidCircuit(
                "circuit must have at least one qubit".into(),
            ));
        }
        if let Some(qubit) = gates.max_qubit().filter(|&q| q >= num_qubits) {
            return Err(ExpectError::QubitOutOfRange { qubit, num_qubits });
        }
        Ok(Self {
            id: id.into(),
            num_qubits,
            gates,
        })
    }

    /// A circuit with no gates.
    pub fn empty(id: impl Into<CircuitId>, num_qubits: u32) -> ExpectResult<Self> {
        Self::new(id, num_qubits, GateSequence::new())
    }

    /// Circuit identifier.
    pub fn id(&self) -> &CircuitId {
        &self.id
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Gates in application order.
    pub fn gates(&self) -> &GateSequence {
        &self.gates
    }

    /// True if there is nothing to simulate.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
