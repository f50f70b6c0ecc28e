//! Greedy fusion of adjacent gates.
//!
//! Consecutive gates are merged into one block while the union of their
//! qubits stays within `max_fused_qubits`; wider gates pass through alone.
//! A block's matrix is built by running its gates on every local basis
//! vector, so applying the fused block is mathematically identical to
//! applying the gates one by one.

use num_complex::Complex32;

use crate::apply::apply_gate;
use crate::config::FusionConfig;
use crate::error::ExpectResult;
use crate::gate::{FusedGate, GateSequence};

/// Fuse a sequence of single gates.
pub fn fuse(gates: Vec<FusedGate>, config: &FusionConfig) -> ExpectResult<GateSequence> {
    let mut fused = GateSequence::new();
    let mut block: Vec<FusedGate> = Vec::new();
    let mut block_qubits: Vec<u32> = Vec::new();

    let limit = config.max_fused_qubits;

    for gate in gates {
        // Gates wider than the limit stay on their own.
        if gate.num_qubits() > limit {
            if !block.is_empty() {
                fused.push(fuse_block(std::mem::take(&mut block), &block_qubits)?);
                block_qubits.clear();
            }
            fused.push(gate);
            continue;
        }

        let mut union = block_qubits.clone();
        for q in gate.qubits() {
            if !union.contains(q) {
                union.push(*q);
            }
        }
        if !block.is_empty() && union.len() > limit {
            fused.push(fuse_block(std::mem::take(&mut block), &block_qubits)?);
            union = gate.qubits().to_vec();
        }
        block_qubits = union;
        block.push(gate);
    }
    if !block.is_empty() {
        fused.push(fuse_block(block, &block_qubits)?);
    }
    Ok(fused)
}

/// Combine `block` into one gate on `qubits`.
fn fuse_block(mut block: Vec<FusedGate>, qubits: &[u32]) -> ExpectResult<FusedGate> {
    if block.len() == 1 {
        if let Some(gate) = block.pop() {
            return Ok(gate);
        }
    }

    // Re-index each gate onto local qubits 0..k of the block.
    let local: Vec<FusedGate> = block
        .iter()
        .map(|g| {
            let qs = g
                .qubits()
                .iter()
                .map(|q| qubits.iter().position(|b| b == q).unwrap_or_default() as u32)
                .collect();
            FusedGate::new(qs, g.matrix().to_vec())
        })
        .collect::<ExpectResult<_>>()?;

    let dim = 1usize << qubits.len();
    let mut matrix = vec![Complex32::new(0.0, 0.0); dim * dim];
    let mut column = vec![Complex32::new(0.0, 0.0); dim];
    for col in 0..dim {
        column.fill(Complex32::new(0.0, 0.0));
        column[col] = Complex32::new(1.0, 0.0);
        for g in &local {
            apply_gate(g, &mut column);
        }
        for (row, amp) in column.iter().enumerate() {
            matrix[row * dim + col] = *amp;
        }
    }

    let source_gates = block.iter().map(FusedGate::source_gates).sum();
    FusedGate::with_source_gates(qubits.to_vec(), matrix, source_gates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_sequence;
    use crate::gate::StandardGate;

    fn gate(g: StandardGate, params: &[f64], qubits: &[u32]) -> FusedGate {
        FusedGate::from_standard(g, params, qubits).unwrap()
    }

    fn run(gates: &GateSequence, num_qubits: u32) -> Vec<Complex32> {
        let mut sv = vec![Complex32::new(0.0, 0.0); 1 << num_qubits];
        sv[0] = Complex32::new(1.0, 0.0);
        apply_sequence(gates, &mut sv);
        sv
    }

    fn sample_gates() -> Vec<FusedGate> {
        vec![
            gate(StandardGate::H, &[], &[0]),
            gate(StandardGate::Rz, &[0.4], &[0]),
            gate(StandardGate::CX, &[], &[0, 1]),
            gate(StandardGate::Ry, &[1.1], &[1]),
            gate(StandardGate::RZZ, &[0.7], &[1, 2]),
            gate(StandardGate::T, &[], &[2]),
            gate(StandardGate::CCX, &[], &[2, 0, 1]),
            gate(StandardGate::SX, &[], &[0]),
        ]
    }

    #[test]
    fn test_fusion_groups_within_width() {
        let config = FusionConfig { max_fused_qubits: 2 };
        let fused = fuse(sample_gates(), &config).unwrap();
        // [H, Rz, CX, Ry] on {0,1}, [RZZ, T] on {1,2}, [CCX], [SX]
        assert_eq!(fused.len(), 4);
        assert_eq!(fused.source_gate_count(), 8);
        assert!(fused.iter().all(|g| g.num_qubits() <= 3));
    }

    #[test]
    fn test_fusion_preserves_state() {
        let unfused: GateSequence = sample_gates().into_iter().collect();
        let expected = run(&unfused, 3);

        for width in 1..=3 {
            let config = FusionConfig {
                max_fused_qubits: width,
            };
            let fused = fuse(sample_gates(), &config).unwrap();
            let got = run(&fused, 3);
            for (a, b) in got.iter().zip(&expected) {
                assert!((a - b).norm() < 1e-5, "width {width}: {a} != {b}");
            }
        }
    }

    #[test]
    fn test_width_one_merges_same_qubit_runs() {
        let config = FusionConfig { max_fused_qubits: 1 };
        let gates = vec![
            gate(StandardGate::H, &[], &[0]),
            gate(StandardGate::S, &[], &[0]),
            gate(StandardGate::X, &[], &[1]),
        ];
        let fused = fuse(gates, &config).unwrap();
        assert_eq!(fused.len(), 2);
        assert_eq!(fused.iter().next().map(FusedGate::source_gates), Some(2));
    }

    #[test]
    fn test_empty_input() {
        let fused = fuse(Vec::new(), &FusionConfig::default()).unwrap();
        assert!(fused.is_empty());
    }
}
