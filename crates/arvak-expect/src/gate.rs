//! Gate types and unitary matrices.
//!
//! Matrices are row-major `2^k × 2^k`. The local basis index of a k-qubit
//! gate is little-endian in its qubit list: the first listed qubit is the
//! least-significant bit, matching the state-vector index convention.

use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use crate::error::{ExpectError, ExpectResult};

/// Standard gates with known semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// Rotation around X axis.
    Rx,
    /// Rotation around Y axis.
    Ry,
    /// Rotation around Z axis.
    Rz,
    /// Phase gate.
    P,
    /// Universal single-qubit gate U(θ, φ, λ).
    U,
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Controlled rotation around Z.
    CRz,
    /// Controlled phase gate.
    CP,
    /// XX rotation gate.
    RXX,
    /// YY rotation gate.
    RYY,
    /// ZZ rotation gate.
    RZZ,
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx => "rx",
            StandardGate::Ry => "ry",
            StandardGate::Rz => "rz",
            StandardGate::P => "p",
            StandardGate::U => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::CRz => "crz",
            StandardGate::CP => "cp",
            StandardGate::RXX => "rxx",
            StandardGate::RYY => "ryy",
            StandardGate::RZZ => "rzz",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::Rx
            | StandardGate::Ry
            | StandardGate::Rz
            | StandardGate::P
            | StandardGate::U => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::CRz
            | StandardGate::CP
            | StandardGate::RXX
            | StandardGate::RYY
            | StandardGate::RZZ => 2,

            StandardGate::CCX => 3,
        }
    }

    /// Number of angle parameters the gate takes.
    pub fn num_params(&self) -> usize {
        match self {
            StandardGate::Rx
            | StandardGate::Ry
            | StandardGate::Rz
            | StandardGate::P
            | StandardGate::CRz
            | StandardGate::CP
            | StandardGate::RXX
            | StandardGate::RYY
            | StandardGate::RZZ => 1,
            StandardGate::U => 3,
            _ => 0,
        }
    }

    /// Unitary matrix of the gate for concrete angles.
    pub fn matrix(&self, params: &[f64]) -> ExpectResult<Vec<Complex64>> {
        if params.len() != self.num_params() {
            return Err(ExpectError::ParameterCount {
                gate: self.name(),
                expected: self.num_params(),
                got: params.len(),
            });
        }

        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);

        let m: Vec<Complex64> = match self {
            StandardGate::I => vec![one, zero, zero, one],
            StandardGate::X => vec![zero, one, one, zero],
            StandardGate::Y => vec![zero, -i, i, zero],
            StandardGate::Z => vec![one, zero, zero, -one],
            StandardGate::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                vec![h, h, h, -h]
            }
            StandardGate::S => diagonal(&[one, i]),
            StandardGate::Sdg => diagonal(&[one, -i]),
            StandardGate::T => diagonal(&[one, Complex64::from_polar(1.0, FRAC_PI_4)]),
            StandardGate::Tdg => diagonal(&[one, Complex64::from_polar(1.0, -FRAC_PI_4)]),
            StandardGate::SX => {
                let a = Complex64::new(0.5, 0.5);
                let b = Complex64::new(0.5, -0.5);
                vec![a, b, b, a]
            }
            StandardGate::Rx => rx(params[0]),
            StandardGate::Ry => {
                let (s, c) = (params[0] / 2.0).sin_cos();
                vec![c.into(), (-s).into(), s.into(), c.into()]
            }
            StandardGate::Rz => rz(params[0]),
            StandardGate::P => diagonal(&[one, Complex64::from_polar(1.0, params[0])]),
            StandardGate::U => {
                let (theta, phi, lambda) = (params[0], params[1], params[2]);
                let (s, c) = (theta / 2.0).sin_cos();
                vec![
                    c.into(),
                    -Complex64::from_polar(s, lambda),
                    Complex64::from_polar(s, phi),
                    Complex64::from_polar(c, phi + lambda),
                ]
            }

            StandardGate::CX => controlled([zero, one, one, zero]),
            StandardGate::CY => controlled([zero, -i, i, zero]),
            StandardGate::CZ => controlled([one, zero, zero, -one]),
            StandardGate::CRz => {
                let r = rz(params[0]);
                controlled([r[0], r[1], r[2], r[3]])
            }
            StandardGate::CP => controlled([one, zero, zero, Complex64::from_polar(1.0, params[0])]),
            StandardGate::Swap => permutation(2, &[(1, 2)]),
            StandardGate::ISwap => {
                let mut m = vec![zero; 16];
                m[0] = one;
                m[4 + 2] = i;
                m[2 * 4 + 1] = i;
                m[15] = one;
                m
            }
            StandardGate::RXX => {
                let (s, c) = (params[0] / 2.0).sin_cos();
                let mis = Complex64::new(0.0, -s);
                let mut m = diagonal(&[c.into(); 4]);
                for k in 0..4 {
                    m[k * 4 + (k ^ 3)] = mis;
                }
                m
            }
            StandardGate::RYY => {
                let (s, c) = (params[0] / 2.0).sin_cos();
                let mut m = diagonal(&[c.into(); 4]);
                // Y⊗Y maps |00⟩ ↔ |11⟩ with phase -1 and |01⟩ ↔ |10⟩ with phase +1.
                m[3] = Complex64::new(0.0, s);
                m[3 * 4] = Complex64::new(0.0, s);
                m[4 + 2] = Complex64::new(0.0, -s);
                m[2 * 4 + 1] = Complex64::new(0.0, -s);
                m
            }
            StandardGate::RZZ => {
                let even = Complex64::from_polar(1.0, -params[0] / 2.0);
                let odd = Complex64::from_polar(1.0, params[0] / 2.0);
                diagonal(&[even, odd, odd, even])
            }
            StandardGate::CCX => permutation(3, &[(3, 7)]),
        };

        Ok(m)
    }
}

fn rx(theta: f64) -> Vec<Complex64> {
    let (s, c) = (theta / 2.0).sin_cos();
    let mis = Complex64::new(0.0, -s);
    vec![c.into(), mis, mis, c.into()]
}

fn rz(theta: f64) -> Vec<Complex64> {
    diagonal(&[
        Complex64::from_polar(1.0, -theta / 2.0),
        Complex64::from_polar(1.0, theta / 2.0),
    ])
}

fn diagonal(entries: &[Complex64]) -> Vec<Complex64> {
    let dim = entries.len();
    let mut m = vec![Complex64::new(0.0, 0.0); dim * dim];
    for (k, e) in entries.iter().enumerate() {
        m[k * dim + k] = *e;
    }
    m
}

/// Two-qubit gate applying `u` to the second qubit when the first is |1⟩.
fn controlled(u: [Complex64; 4]) -> Vec<Complex64> {
    let mut m = diagonal(&[Complex64::new(1.0, 0.0); 4]);
    // Local indices with the control bit set: 1 (target 0) and 3 (target 1).
    m[4 + 1] = u[0];
    m[4 + 3] = u[1];
    m[3 * 4 + 1] = u[2];
    m[3 * 4 + 3] = u[3];
    m
}

fn permutation(num_qubits: usize, swaps: &[(usize, usize)]) -> Vec<Complex64> {
    let dim = 1 << num_qubits;
    let mut target: Vec<usize> = (0..dim).collect();
    for &(a, b) in swaps {
        target.swap(a, b);
    }
    let mut m = vec![Complex64::new(0.0, 0.0); dim * dim];
    for (col, row) in target.into_iter().enumerate() {
        m[row * dim + col] = Complex64::new(1.0, 0.0);
    }
    m
}

/// A unitary acting on a fixed set of qubits, possibly the product of
/// several adjacent gates.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedGate {
    qubits: Vec<u32>,
    matrix: Vec<Complex32>,
    source_gates: usize,
}

impl FusedGate {
    /// Create a gate from its qubits and row-major matrix.
    pub fn new(qubits: Vec<u32>, matrix: Vec<Complex32>) -> ExpectResult<Self> {
        Self::with_source_gates(qubits, matrix, 1)
    }

    /// Create a gate that stands for `source_gates` fused operations.
    pub fn with_source_gates(
        qubits: Vec<u32>,
        matrix: Vec<Complex32>,
        source_gates: usize,
    ) -> ExpectResult<Self> {
        if qubits.is_empty() {
            return Err(invalid("fused", "gate addresses no qubits"));
        }
        for (k, q) in qubits.iter().enumerate() {
            if qubits[..k].contains(q) {
                return Err(invalid("fused", format!("duplicate qubit {q}")));
            }
        }
        let dim = 1usize << qubits.len();
        if matrix.len() != dim * dim {
            return Err(invalid(
                "fused",
                format!(
                    "matrix has {} entries, expected {} for {} qubits",
                    matrix.len(),
                    dim * dim,
                    qubits.len()
                ),
            ));
        }
        Ok(Self {
            qubits,
            matrix,
            source_gates,
        })
    }

    /// Build a single (unfused) gate from a standard gate and concrete angles.
    pub fn from_standard(gate: StandardGate, params: &[f64], qubits: &[u32]) -> ExpectResult<Self> {
        if qubits.len() != gate.num_qubits() as usize {
            return Err(invalid(
                gate.name(),
                format!("requires {} qubits, got {}", gate.num_qubits(), qubits.len()),
            ));
        }
        let matrix = gate
            .matrix(params)?
            .into_iter()
            .map(|c| Complex32::new(c.re as f32, c.im as f32))
            .collect();
        Self::new(qubits.to_vec(), matrix).map_err(|e| match e {
            ExpectError::InvalidGate { reason, .. } => invalid(gate.name(), reason),
            other => other,
        })
    }

    /// Qubits the gate acts on, in local bit order.
    pub fn qubits(&self) -> &[u32] {
        &self.qubits
    }

    /// Row-major unitary matrix.
    pub fn matrix(&self) -> &[Complex32] {
        &self.matrix
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of original operations folded into this gate.
    pub fn source_gates(&self) -> usize {
        self.source_gates
    }
}

fn invalid(gate: &str, reason: impl Into<String>) -> ExpectError {
    ExpectError::InvalidGate {
        gate: gate.to_string(),
        reason: reason.into(),
    }
}

/// An ordered sequence of fused gates for one circuit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateSequence {
    gates: Vec<FusedGate>,
}

impl GateSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate.
    pub fn push(&mut self, gate: FusedGate) {
        self.gates.push(gate);
    }

    /// Gates in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, FusedGate> {
        self.gates.iter()
    }

    /// Number of fused gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// True if the sequence holds no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of original operations across all fused gates.
    pub fn source_gate_count(&self) -> usize {
        self.gates.iter().map(FusedGate::source_gates).sum()
    }

    /// The highest qubit index addressed, or `None` for an empty sequence.
    pub fn max_qubit(&self) -> Option<u32> {
        self.gates
            .iter()
            .flat_map(|g| g.qubits.iter().copied())
            .max()
    }
}

impl FromIterator<FusedGate> for GateSequence {
    fn from_iter<T: IntoIterator<Item = FusedGate>>(iter: T) -> Self {
        Self {
            gates: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a GateSequence {
    type Item = &'a FusedGate;
    type IntoIter = std::slice::Iter<'a, FusedGate>;

    fn into_iter(self) -> Self::IntoIter {
        self.gates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const ALL: [StandardGate; 26] = [
        StandardGate::I,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
        StandardGate::H,
        StandardGate::S,
        StandardGate::Sdg,
        StandardGate::T,
        StandardGate::Tdg,
        StandardGate::SX,
        StandardGate::Rx,
        StandardGate::Ry,
        StandardGate::Rz,
        StandardGate::P,
        StandardGate::U,
        StandardGate::CX,
        StandardGate::CY,
        StandardGate::CZ,
        StandardGate::Swap,
        StandardGate::ISwap,
        StandardGate::CRz,
        StandardGate::CP,
        StandardGate::RXX,
        StandardGate::RYY,
        StandardGate::RZZ,
        StandardGate::CCX,
    ];

    fn is_unitary(m: &[Complex64], dim: usize) -> bool {
        for r in 0..dim {
            for c in 0..dim {
                let dot: Complex64 = (0..dim).map(|k| m[k * dim + r].conj() * m[k * dim + c]).sum();
                let expected = if r == c { 1.0 } else { 0.0 };
                if (dot - Complex64::new(expected, 0.0)).norm() > 1e-12 {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_every_standard_gate_is_unitary() {
        for gate in ALL {
            let params = vec![0.37 * PI; gate.num_params()];
            let m = gate.matrix(&params).unwrap();
            let dim = 1 << gate.num_qubits();
            assert_eq!(m.len(), dim * dim, "{}", gate.name());
            assert!(is_unitary(&m, dim), "{} is not unitary", gate.name());
        }
    }

    #[test]
    fn test_parameter_count_checked() {
        let err = StandardGate::Rx.matrix(&[]).unwrap_err();
        assert!(matches!(
            err,
            ExpectError::ParameterCount {
                gate: "rx",
                expected: 1,
                got: 0
            }
        ));
    }

    #[test]
    fn test_cx_flips_target_when_control_set() {
        let m = StandardGate::CX.matrix(&[]).unwrap();
        // Column 1 (control=1, target=0) maps to row 3.
        assert_eq!(m[3 * 4 + 1], Complex64::new(1.0, 0.0));
        assert_eq!(m[1 * 4 + 1], Complex64::new(0.0, 0.0));
        // Column 2 (control=0, target=1) is untouched.
        assert_eq!(m[2 * 4 + 2], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_fused_gate_rejects_bad_dimension() {
        let err = FusedGate::new(vec![0, 1], vec![Complex32::new(1.0, 0.0); 4]).unwrap_err();
        assert!(matches!(err, ExpectError::InvalidGate { .. }));
    }

    #[test]
    fn test_fused_gate_rejects_duplicate_qubits() {
        let err = FusedGate::from_standard(StandardGate::CX, &[], &[1, 1]).unwrap_err();
        match err {
            ExpectError::InvalidGate { gate, reason } => {
                assert_eq!(gate, "cx");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gate_sequence_bookkeeping() {
        let seq: GateSequence = [
            FusedGate::from_standard(StandardGate::H, &[], &[0]).unwrap(),
            FusedGate::from_standard(StandardGate::CX, &[], &[0, 3]).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.max_qubit(), Some(3));
        assert_eq!(seq.source_gate_count(), 2);
        assert!(GateSequence::new().is_empty());
    }

    #[test]
    fn test_gate_name_serde() {
        let json = serde_json::to_string(&StandardGate::ISwap).unwrap();
        assert_eq!(json, "\"iswap\"");
        let g: StandardGate = serde_json::from_str("\"rzz\"").unwrap();
        assert_eq!(g, StandardGate::RZZ);
    }
}
