//! Observables measured on simulated circuits.
//!
//! Each observable is a real linear combination of Pauli strings. The
//! evaluator reports `⟨ψ|O|ψ⟩` per (circuit, observable) cell, so every
//! type here serializes in the batch file format: a string is a list of
//! `[qubit, op]` pairs and a sum is a list of `{coeff, pauli}` terms.
//!
//! ```rust
//! use arvak_expect::pauli::{PauliOp, PauliString, PauliSum, PauliTerm};
//!
//! // Two-site XY coupling with a field on the second site.
//! let xy = PauliSum::from_terms(vec![
//!     PauliTerm::new(0.5, PauliString::from_ops([(1, PauliOp::X), (2, PauliOp::X)])),
//!     PauliTerm::new(0.5, PauliString::from_ops([(1, PauliOp::Y), (2, PauliOp::Y)])),
//!     PauliTerm::z(2, -0.25),
//! ]);
//! assert_eq!(xy.min_qubits(), 3);
//! assert!((xy.lambda() - 1.25).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ExpectError, ExpectResult};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity. Dropped from strings.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

/// Pauli operators acting on a subset of a circuit's qubits.
///
/// Unlisted qubits see the identity. Ops are kept in qubit order; a qubit
/// may appear more than once, in which case the operators multiply in
/// the order given and `validate` reports the string as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(u32, PauliOp)>", into = "Vec<(u32, PauliOp)>")]
pub struct PauliString {
    /// Ordered by qubit; no `PauliOp::I` entries.
    ops: Vec<(u32, PauliOp)>,
}

impl PauliString {
    /// Build a string from `(qubit, op)` pairs in any order.
    ///
    /// `I` entries are discarded. The sort is stable, so repeated qubits
    /// keep their relative order.
    pub fn from_ops(ops: impl IntoIterator<Item = (u32, PauliOp)>) -> Self {
        let mut v: Vec<(u32, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// The identity string.
    pub fn identity() -> Self {
        Self { ops: Vec::new() }
    }

    /// The operators that act non-trivially.
    pub fn ops(&self) -> &[(u32, PauliOp)] {
        &self.ops
    }

    /// True if the string acts as the identity everywhere.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if the string is diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        self.ops.iter().all(|(_, op)| *op == PauliOp::Z)
    }

    /// Largest qubit the string touches.
    pub fn max_qubit(&self) -> Option<u32> {
        self.ops.last().map(|(q, _)| *q)
    }

    /// Check that every qubit is in range and addressed at most once.
    pub fn validate(&self, num_qubits: u32) -> ExpectResult<()> {
        for pair in self.ops.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ExpectError::InvalidObservable(format!(
                    "qubit {} carries more than one Pauli operator",
                    pair[0].0
                )));
            }
        }
        match self.max_qubit() {
            Some(qubit) if qubit >= num_qubits => {
                Err(ExpectError::QubitOutOfRange { qubit, num_qubits })
            }
            _ => Ok(()),
        }
    }
}

impl From<Vec<(u32, PauliOp)>> for PauliString {
    fn from(ops: Vec<(u32, PauliOp)>) -> Self {
        Self::from_ops(ops)
    }
}

impl From<PauliString> for Vec<(u32, PauliOp)> {
    fn from(ps: PauliString) -> Self {
        ps.ops
    }
}

/// One summand of an observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    pub coeff: f64,
    pub pauli: PauliString,
}

impl PauliTerm {
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }

    /// Constant offset `coeff`.
    pub fn identity(coeff: f64) -> Self {
        Self::new(coeff, PauliString::identity())
    }

    pub fn x(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::X)]))
    }

    pub fn y(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::Y)]))
    }

    pub fn z(qubit: u32, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(qubit, PauliOp::Z)]))
    }

    /// `coeff · Z_q0 Z_q1`, the usual Ising coupling.
    pub fn zz(q0: u32, q1: u32, coeff: f64) -> Self {
        Self::new(
            coeff,
            PauliString::from_ops([(q0, PauliOp::Z), (q1, PauliOp::Z)]),
        )
    }
}

/// An observable: the terms are summed with their coefficients.
///
/// Serialized as the bare term list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PauliSum {
    terms: Vec<PauliTerm>,
}

impl PauliSum {
    /// Wrap a term list. Terms are not merged or reordered.
    pub fn from_terms(terms: Vec<PauliTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// An empty observable evaluates to exactly zero.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Copy of this sum with every coefficient multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        self.terms
            .iter()
            .map(|t| PauliTerm::new(t.coeff * factor, t.pauli.clone()))
            .collect()
    }

    /// Σ |c_k|, an upper bound on |⟨O⟩| for any normalised state.
    pub fn lambda(&self) -> f64 {
        self.terms.iter().map(|t| t.coeff.abs()).sum()
    }

    /// Width a circuit needs before this observable can be measured on it.
    pub fn min_qubits(&self) -> u32 {
        self.terms
            .iter()
            .filter_map(|t| t.pauli.max_qubit().map(|q| q + 1))
            .max()
            .unwrap_or(0)
    }

    /// Check every term against a circuit of `num_qubits` qubits.
    pub fn validate(&self, num_qubits: u32) -> ExpectResult<()> {
        self.terms
            .iter()
            .try_for_each(|t| t.pauli.validate(num_qubits))
    }
}

impl FromIterator<PauliTerm> for PauliSum {
    fn from_iter<T: IntoIterator<Item = PauliTerm>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
