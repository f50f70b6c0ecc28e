//! Gate application on a state vector.
//!
//! Amplitude index `i` encodes qubit `q` in bit `q` of `i`. A gate acting
//! on qubits `[q0, q1, ...]` sees local index bit 0 as `q0`, bit 1 as `q1`
//! and so on.

use num_complex::Complex32;

use crate::gate::{FusedGate, GateSequence};

/// Apply every gate of `gates` to `state`, in order.
///
/// `state` must be the circuit's state truncated to its qubit count.
pub fn apply_sequence(gates: &GateSequence, state: &mut [Complex32]) {
    for gate in gates {
        apply_gate(gate, state);
    }
}

/// Apply a single (possibly fused) gate in place.
pub fn apply_gate(gate: &FusedGate, state: &mut [Complex32]) {
    let qubits = gate.qubits();
    let m = gate.matrix();
    match qubits.len() {
        1 => apply_one(state, qubits[0] as usize, m),
        2 => apply_two(state, qubits[0] as usize, qubits[1] as usize, m),
        _ => apply_many(state, qubits, m),
    }
}

fn apply_one(state: &mut [Complex32], qubit: usize, m: &[Complex32]) {
    let mask = 1 << qubit;
    for i in 0..state.len() {
        if i & mask == 0 {
            let j = i | mask;
            let a = state[i];
            let b = state[j];
            state[i] = m[0] * a + m[1] * b;
            state[j] = m[2] * a + m[3] * b;
        }
    }
}

fn apply_two(state: &mut [Complex32], q0: usize, q1: usize, m: &[Complex32]) {
    let m0 = 1 << q0;
    let m1 = 1 << q1;
    let both = m0 | m1;
    for i in 0..state.len() {
        if i & both == 0 {
            let idx = [i, i | m0, i | m1, i | both];
            let v = idx.map(|k| state[k]);
            for (r, &k) in idx.iter().enumerate() {
                let row = &m[r * 4..r * 4 + 4];
                state[k] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
            }
        }
    }
}

fn apply_many(state: &mut [Complex32], qubits: &[u32], m: &[Complex32]) {
    let dim = 1usize << qubits.len();
    let masks: Vec<usize> = qubits.iter().map(|&q| 1usize << q).collect();
    let all: usize = masks.iter().sum();

    // Offsets of each local basis state relative to the base index.
    let offsets: Vec<usize> = (0..dim)
        .map(|k| {
            masks
                .iter()
                .enumerate()
                .filter(|(bit, _)| k & (1 << bit) != 0)
                .map(|(_, mask)| mask)
                .sum()
        })
        .collect();

    let mut v = vec![Complex32::new(0.0, 0.0); dim];
    for base in 0..state.len() {
        if base & all != 0 {
            continue;
        }
        for (slot, off) in v.iter_mut().zip(&offsets) {
            *slot = state[base + off];
        }
        for (r, off) in offsets.iter().enumerate() {
            let row = &m[r * dim..(r + 1) * dim];
            state[base + off] = row.iter().zip(&v).map(|(a, b)| a * b).sum();
        }
    }
}

/// Squared norm ⟨ψ|ψ⟩, accumulated in double precision.
pub fn norm_sqr(state: &[Complex32]) -> f64 {
    state.iter().map(|a| f64::from(a.norm_sqr())).sum()
}
