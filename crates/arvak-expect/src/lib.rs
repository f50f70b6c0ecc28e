//! `arvak-expect` — batched expectation values of Pauli-sum observables.
//!
//! Given a batch of parameter-bound circuits and, per circuit, a list of
//! observables, the engine simulates each circuit on a reusable pair of
//! state-vector buffers and returns one expectation value per
//! (circuit, observable) cell:
//!
//! - **StateBuffers**: primary + scratch buffers that grow to the widest
//!   circuit seen and never shrink within a batch
//! - **Gate application**: fused unitaries applied in sequence order
//! - **Expectation evaluation**: `Σ c_k ⟨ψ|P_k|ψ⟩` using the scratch buffer
//! - **ExpectationEngine**: the orchestrator producing a [`ResultMatrix`]
//!
//! Circuits usually come from [`Program`]s resolved against symbol values
//! by [`prepare_batch`], which also fuses adjacent gates.
//!
//! # Quick start
//!
//! ```rust
//! use arvak_expect::{
//!     ExpectationEngine, FusionConfig, Param, PauliSum, PauliTerm, Program, StandardGate,
//!     SymbolMap, prepare_batch,
//! };
//!
//! // Ry(θ)|0⟩ has ⟨Z⟩ = cos θ.
//! let program = Program::new(1).with(StandardGate::Ry, vec![Param::symbol("theta")], vec![0]);
//! let symbols: SymbolMap = [("theta".to_string(), 0.0)].into_iter().collect();
//! let circuits = prepare_batch(&[program], &[symbols], &FusionConfig::default()).unwrap();
//!
//! let z = PauliSum::from_terms(vec![PauliTerm::z(0, 1.0)]);
//! let result = ExpectationEngine::default().run(&circuits, &[vec![z]]).unwrap();
//! assert_eq!(result.shape(), (1, 1));
//! assert!((result.get(0, 0).unwrap() - 1.0).abs() < 1e-5);
//! ```

pub mod apply;
pub mod batch;
pub mod buffer;
pub mod circuit;
pub mod config;
pub mod error;
pub mod expectation;
pub mod fusion;
pub mod gate;
pub mod pauli;
pub mod prepare;
pub mod program;

pub use batch::{BatchStats, EMPTY_CIRCUIT_SENTINEL, ExpectationEngine, ResultMatrix};
pub use buffer::{StateBuffer, StateBuffers};
pub use circuit::{Circuit, CircuitId};
pub use config::{EngineConfig, FusionConfig};
pub use error::{ExpectError, ExpectResult};
pub use expectation::ExpectationEvaluator;
pub use gate::{FusedGate, GateSequence, StandardGate};
pub use pauli::{PauliOp, PauliString, PauliSum, PauliTerm};
pub use prepare::{prepare_batch, validate_observables};
pub use program::{Operation, Param, Program, SymbolMap};
