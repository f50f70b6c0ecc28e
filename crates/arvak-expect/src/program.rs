//! Parameterized programs and symbol resolution.
//!
//! A [`Program`] is the unresolved form of a circuit: standard gates whose
//! angles may name symbols. Resolving it against a [`SymbolMap`] binds the
//! angles, builds gate matrices and fuses adjacent gates into a
//! [`Circuit`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, CircuitId};
use crate::config::FusionConfig;
use crate::error::{ExpectError, ExpectResult};
use crate::fusion::fuse;
use crate::gate::{FusedGate, StandardGate};

/// Symbol name to value bindings for one circuit.
pub type SymbolMap = FxHashMap<String, f64>;

/// A gate angle: a constant, a symbol, or a scaled symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// `factor · symbol`.
    Scaled {
        /// Symbol name.
        symbol: String,
        /// Multiplier applied to the bound value.
        factor: f64,
    },
}

impl Param {
    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        Param::Symbol(name.into())
    }

    /// Evaluate against a symbol map.
    pub fn value(&self, symbols: &SymbolMap) -> ExpectResult<f64> {
        let lookup = |name: &str| {
            symbols
                .get(name)
                .copied()
                .ok_or_else(|| ExpectError::UnboundSymbol(name.to_string()))
        };
        match self {
            Param::Constant(v) => Ok(*v),
            Param::Symbol(name) => lookup(name),
            Param::Scaled { symbol, factor } => Ok(factor * lookup(symbol)?),
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Constant(value)
    }
}

/// A gate applied to specific qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The gate.
    pub gate: StandardGate,
    /// Angle parameters, in the gate's order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// Target qubits.
    pub qubits: Vec<u32>,
}

impl Operation {
    /// Create an operation.
    pub fn new(gate: StandardGate, params: Vec<Param>, qubits: Vec<u32>) -> Self {
        Self {
            gate,
            params,
            qubits,
        }
    }
}

/// An unresolved circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Number of qubits.
    pub num_qubits: u32,
    /// Operations in order.
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Program {
    /// Create an empty program.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            operations: Vec::new(),
        }
    }

    /// Append an operation, builder style.
    #[must_use]
    pub fn with(mut self, gate: StandardGate, params: Vec<Param>, qubits: Vec<u32>) -> Self {
        self.operations.push(Operation::new(gate, params, qubits));
        self
    }

    /// Bind symbols, build matrices and fuse into a circuit.
    pub fn resolve(
        &self,
        id: impl Into<CircuitId>,
        symbols: &SymbolMap,
        fusion: &FusionConfig,
    ) -> ExpectResult<Circuit> {
        let gates = self
            .operations
            .iter()
            .map(|op| {
                if let Some(&qubit) = op.qubits.iter().find(|&&q| q >= self.num_qubits) {
                    return Err(ExpectError::QubitOutOfRange {
                        qubit,
                        num_qubits: self.num_qubits,
                    });
                }
                let values = op
                    .params
                    .iter()
                    .map(|p| p.value(symbols))
                    .collect::<ExpectResult<Vec<_>>>()?;
                FusedGate::from_standard(op.gate, &values, &op.qubits)
            })
            .collect::<ExpectResult<Vec<_>>>()?;

        Circuit::new(id, self.num_qubits, fuse(gates, fusion)?)
    }
}
