//! Expectation values of Pauli sums.
//!
//! For a term `c · P` the evaluator copies ψ into the scratch buffer,
//! applies the term's single-qubit Paulis to the addressed qubits only,
//! and accumulates `c · ⟨ψ|Pψ⟩`. Z-only strings skip the scratch buffer
//! and sum signed probabilities directly.

use num_complex::{Complex32, Complex64};
use tracing::warn;

use crate::pauli::{PauliOp, PauliString, PauliSum};

/// Evaluates Pauli-sum observables against a state vector.
#[derive(Debug, Clone, Copy)]
pub struct ExpectationEvaluator {
    imag_tolerance: f64,
}

impl Default for ExpectationEvaluator {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

impl ExpectationEvaluator {
    /// Create an evaluator that warns when the imaginary residue of the
    /// sum exceeds `imag_tolerance`.
    pub fn new(imag_tolerance: f64) -> Self {
        Self { imag_tolerance }
    }

    /// ⟨ψ|O|ψ⟩ for a Hermitian Pauli sum `O`.
    ///
    /// `state` and `scratch` must have the same length. `state` is not
    /// modified; `scratch` holds garbage afterwards.
    pub fn evaluate(&self, observable: &PauliSum, state: &[Complex32], scratch: &mut [Complex32]) -> f32 {
        debug_assert_eq!(state.len(), scratch.len());
        if observable.is_empty() {
            return 0.0;
        }

        let mut total = Complex64::new(0.0, 0.0);
        for term in observable.terms() {
            let value = if term.pauli.is_diagonal() {
                Complex64::new(diagonal_expectation(&term.pauli, state), 0.0)
            } else {
                dense_expectation(&term.pauli, state, scratch)
            };
            total += term.coeff * value;
        }

        if total.im.abs() > self.imag_tolerance {
            warn!(
                "Expectation value has imaginary residue {:.3e} (real part {:.6})",
                total.im, total.re
            );
        }

        total.re as f32
    }
}

/// Σ_k |ψ_k|² · (−1)^{popcount(k & zmask)}.
///
/// A qubit named twice contributes Z·Z = I, so the mask toggles per
/// occurrence.
fn diagonal_expectation(pauli: &PauliString, state: &[Complex32]) -> f64 {
    let zmask = pauli
        .ops()
        .iter()
        .fold(0usize, |mask, &(q, _)| mask ^ (1usize << q));
    state
        .iter()
        .enumerate()
        .map(|(k, a)| {
            let p = f64::from(a.norm_sqr());
            if (k & zmask).count_ones() % 2 == 0 { p } else { -p }
        })
        .sum()
}

/// ⟨ψ|Pψ⟩ with `P` applied operator by operator to a copy in `scratch`.
fn dense_expectation(
    pauli: &PauliString,
    state: &[Complex32],
    scratch: &mut [Complex32],
) -> Complex64 {
    scratch.copy_from_slice(state);
    for &(qubit, op) in pauli.ops() {
        apply_pauli(scratch, qubit as usize, op);
    }
    inner_product(state, scratch)
}

/// Apply a single-qubit Pauli in place.
fn apply_pauli(state: &mut [Complex32], qubit: usize, op: PauliOp) {
    let mask = 1 << qubit;
    match op {
        PauliOp::I => {}
        PauliOp::X => {
            for i in 0..state.len() {
                if i & mask == 0 {
                    state.swap(i, i | mask);
                }
            }
        }
        PauliOp::Y => {
            let i_val = Complex32::new(0.0, 1.0);
            for i in 0..state.len() {
                if i & mask == 0 {
                    let j = i | mask;
                    let tmp = state[i];
                    state[i] = -i_val * state[j];
                    state[j] = i_val * tmp;
                }
            }
        }
        PauliOp::Z => {
            for (i, amp) in state.iter_mut().enumerate() {
                if i & mask != 0 {
                    *amp = -*amp;
                }
            }
        }
    }
}

/// ⟨a|b⟩ accumulated in double precision.
fn inner_product(a: &[Complex32], b: &[Complex32]) -> Complex64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let x = Complex64::new(f64::from(x.re), f64::from(x.im));
            let y = Complex64::new(f64::from(y.re), f64::from(y.im));
            x.conj() * y
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauli::PauliTerm;
    use proptest::prelude::*;

    fn basis(num_qubits: u32, index: usize) -> Vec<Complex32> {
        let mut sv = vec![Complex32::new(0.0, 0.0); 1 << num_qubits];
        sv[index] = Complex32::new(1.0, 0.0);
        sv
    }

    fn eval(o: &PauliSum, state: &[Complex32]) -> f32 {
        let mut scratch = vec![Complex32::new(0.0, 0.0); state.len()];
        ExpectationEvaluator::default().evaluate(o, state, &mut scratch)
    }

    #[test]
    fn test_z_on_zero_state() {
        let o = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        assert!((eval(&o, &basis(3, 0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_z_on_one_state() {
        let o = PauliSum::from_terms(vec![PauliTerm::z(1, 2.0)]);
        // |010⟩: qubit 1 is set.
        assert!((eval(&o, &basis(3, 2)) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_x_and_y_on_plus_states() {
        let h = std::f32::consts::FRAC_1_SQRT_2;
        let plus = vec![Complex32::new(h, 0.0), Complex32::new(h, 0.0)];
        let plus_i = vec![Complex32::new(h, 0.0), Complex32::new(0.0, h)];

        let x = PauliSum::from_terms(vec![PauliTerm::x(0, 1.0)]);
        let y = PauliSum::from_terms(vec![PauliTerm::y(0, 1.0)]);
        assert!((eval(&x, &plus) - 1.0).abs() < 1e-6);
        assert!(eval(&y, &plus).abs() < 1e-6);
        assert!((eval(&y, &plus_i) - 1.0).abs() < 1e-6);
        assert!(eval(&x, &plus_i).abs() < 1e-6);
    }

    #[test]
    fn test_identity_term_is_norm() {
        let o = PauliSum::from_terms(vec![PauliTerm::identity(0.75)]);
        assert!((eval(&o, &basis(2, 3)) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_empty_sum_is_zero() {
        assert_eq!(eval(&PauliSum::default(), &basis(1, 0)), 0.0);

        let mut scratch = vec![Complex32::new(7.0, 0.0); 2];
        let value =
            ExpectationEvaluator::default().evaluate(&PauliSum::default(), &basis(1, 1), &mut scratch);
        assert_eq!(value, 0.0);
        assert!(scratch.iter().all(|a| *a == Complex32::new(7.0, 0.0)));
    }

    #[test]
    fn test_state_left_untouched() {
        let h = std::f32::consts::FRAC_1_SQRT_2;
        let state = vec![
            Complex32::new(h, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(0.0, h),
        ];
        let before = state.clone();
        let o = PauliSum::from_terms(vec![PauliTerm::x(0, 1.0), PauliTerm::y(1, 1.0)]);
        eval(&o, &state);
        assert_eq!(state, before);
    }

    #[test]
    fn test_bell_correlators() {
        let h = std::f32::consts::FRAC_1_SQRT_2;
        let bell = vec![
            Complex32::new(h, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(0.0, 0.0),
            Complex32::new(h, 0.0),
        ];
        let zz = PauliSum::from_terms(vec![PauliTerm::zz(0, 1, 1.0)]);
        let xx = PauliSum::from_terms(vec![PauliTerm::new(
            1.0,
            PauliString::from_ops([(0, PauliOp::X), (1, PauliOp::X)]),
        )]);
        let yy = PauliSum::from_terms(vec![PauliTerm::new(
            1.0,
            PauliString::from_ops([(0, PauliOp::Y), (1, PauliOp::Y)]),
        )]);
        let z0 = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
        assert!((eval(&zz, &bell) - 1.0).abs() < 1e-6);
        assert!((eval(&xx, &bell) - 1.0).abs() < 1e-6);
        assert!((eval(&yy, &bell) + 1.0).abs() < 1e-6);
        assert!(eval(&z0, &bell).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_qubit_cancels() {
        // |10⟩: qubit 1 set, qubit 0 clear.
        let state = basis(2, 2);
        let z0z0 = PauliSum::from_terms(vec![PauliTerm::new(
            1.0,
            PauliString::from_ops([(0, PauliOp::Z), (0, PauliOp::Z)]),
        )]);
        let x0x0 = PauliSum::from_terms(vec![PauliTerm::new(
            1.0,
            PauliString::from_ops([(0, PauliOp::X), (0, PauliOp::X)]),
        )]);
        let z1z1z1 = PauliSum::from_terms(vec![PauliTerm::new(
            1.0,
            PauliString::from_ops([(1, PauliOp::Z), (1, PauliOp::Z), (1, PauliOp::Z)]),
        )]);
        assert!((eval(&z0z0, &state) - 1.0).abs() < 1e-6);
        assert!((eval(&x0x0, &state) - 1.0).abs() < 1e-6);
        assert!((eval(&z1z1z1, &state) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_diagonal_matches_dense_on_repeated_qubits() {
        let h = 0.5_f32;
        let state = vec![
            Complex32::new(h, 0.0),
            Complex32::new(0.0, h),
            Complex32::new(-h, 0.0),
            Complex32::new(h, 0.0),
        ];
        let mut scratch = vec![Complex32::new(0.0, 0.0); 4];
        for ops in [
            vec![(0, PauliOp::Z), (0, PauliOp::Z)],
            vec![(0, PauliOp::Z), (1, PauliOp::Z), (0, PauliOp::Z)],
            vec![(1, PauliOp::Z), (1, PauliOp::Z), (1, PauliOp::Z)],
        ] {
            let pauli = PauliString::from_ops(ops);
            let fast = diagonal_expectation(&pauli, &state);
            let dense = dense_expectation(&pauli, &state, &mut scratch);
            assert!((fast - dense.re).abs() < 1e-6);
            assert!(dense.im.abs() < 1e-6);
        }
    }

    fn arb_state(num_qubits: u32) -> impl Strategy<Value = Vec<Complex32>> {
        prop::collection::vec((-1.0_f32..1.0, -1.0_f32..1.0), 1usize << num_qubits).prop_filter_map(
            "zero vector",
            |amps| {
                let norm = amps
                    .iter()
                    .map(|(re, im)| re * re + im * im)
                    .sum::<f32>()
                    .sqrt();
                (norm > 1e-3).then(|| {
                    amps.into_iter()
                        .map(|(re, im)| Complex32::new(re / norm, im / norm))
                        .collect::<Vec<_>>()
                })
            },
        )
    }

    fn arb_z_string(num_qubits: u32) -> impl Strategy<Value = PauliString> {
        prop::collection::vec(0..num_qubits, 0..=6)
            .prop_map(|qubits| PauliString::from_ops(qubits.into_iter().map(|q| (q, PauliOp::Z))))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn diagonal_path_agrees_with_dense_path(
            (state, pauli) in (1_u32..=4).prop_flat_map(|n| (arb_state(n), arb_z_string(n)))
        ) {
            let mut scratch = vec![Complex32::new(0.0, 0.0); state.len()];
            let fast = diagonal_expectation(&pauli, &state);
            let dense = dense_expectation(&pauli, &state, &mut scratch);
            prop_assert!((fast - dense.re).abs() < 1e-5);
            prop_assert!(dense.im.abs() < 1e-5);
        }
    }
}
