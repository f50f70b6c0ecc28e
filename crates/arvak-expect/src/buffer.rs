//! Reusable state-vector buffers.
//!
//! A batch owns exactly one [`StateBuffers`] arena per device: a primary
//! buffer holding the evolving state and a scratch buffer used while
//! evaluating observables. The arena only ever grows, so a batch whose
//! circuits increase in width reallocates at most once per new maximum.

use num_complex::Complex32;
use tracing::debug;

use crate::error::{ExpectError, ExpectResult};

/// A dense complex amplitude vector.
#[derive(Debug, Clone, Default)]
pub struct StateBuffer {
    amplitudes: Vec<Complex32>,
}

impl StateBuffer {
    /// Allocate a zeroed buffer of exactly `2^num_qubits` amplitudes.
    fn allocate(num_qubits: u32) -> Result<Self, std::collections::TryReserveError> {
        let len = 1usize << num_qubits;
        let mut amplitudes = Vec::new();
        amplitudes.try_reserve_exact(len)?;
        amplitudes.resize(len, Complex32::new(0.0, 0.0));
        Ok(Self { amplitudes })
    }

    /// Number of amplitudes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.amplitudes.len()
    }

    /// The first `2^num_qubits` amplitudes.
    pub fn as_slice(&self, num_qubits: u32) -> &[Complex32] {
        &self.amplitudes[..1usize << num_qubits]
    }

    /// The first `2^num_qubits` amplitudes, mutably.
    pub fn as_mut_slice(&mut self, num_qubits: u32) -> &mut [Complex32] {
        &mut self.amplitudes[..1usize << num_qubits]
    }
}

/// Primary and scratch buffers sized for the widest circuit seen so far.
#[derive(Debug)]
pub struct StateBuffers {
    primary: StateBuffer,
    scratch: StateBuffer,
    /// Largest qubit count ensured so far.
    num_qubits: u32,
    /// Hard upper bound on `num_qubits`.
    limit: u32,
    growths: usize,
}

impl StateBuffers {
    /// Allocate both buffers for a single qubit.
    pub fn new(limit: u32) -> ExpectResult<Self> {
        let mut buffers = Self {
            primary: StateBuffer::default(),
            scratch: StateBuffer::default(),
            num_qubits: 0,
            limit,
            growths: 0,
        };
        buffers.ensure_capacity(1)?;
        buffers.growths = 0;
        Ok(buffers)
    }

    /// Make both buffers hold at least `2^num_qubits` amplitudes.
    ///
    /// Reallocates to exactly `2^num_qubits` only when `num_qubits` exceeds
    /// the previous maximum; otherwise this is a no-op. Returns `true` if
    /// the buffers were reallocated.
    pub fn ensure_capacity(&mut self, num_qubits: u32) -> ExpectResult<bool> {
        if num_qubits <= self.num_qubits {
            return Ok(false);
        }
        if num_qubits > self.limit {
            return Err(ExpectError::QubitLimitExceeded {
                num_qubits,
                max_qubits: self.limit,
            });
        }

        let bytes = 2 * (1usize << num_qubits) * std::mem::size_of::<Complex32>();
        debug!(
            "Growing state buffers: {} -> {} qubits ({} bytes)",
            self.num_qubits, num_qubits, bytes
        );

        // Release the old pair before allocating the new one.
        self.primary = StateBuffer::default();
        self.scratch = StateBuffer::default();
        self.num_qubits = 0;

        let alloc_err = |_| ExpectError::Allocation { num_qubits, bytes };
        self.primary = StateBuffer::allocate(num_qubits).map_err(alloc_err)?;
        self.scratch = StateBuffer::allocate(num_qubits).map_err(alloc_err)?;
        self.num_qubits = num_qubits;
        self.growths += 1;
        Ok(true)
    }

    /// Write |0…0⟩ into the first `2^num_qubits` primary amplitudes.
    ///
    /// Amplitudes beyond `2^num_qubits` are left untouched and never read.
    ///
    /// # Panics
    ///
    /// Panics if `num_qubits` exceeds the ensured capacity.
    pub fn reset_to_zero_state(&mut self, num_qubits: u32) {
        assert!(
            num_qubits <= self.num_qubits,
            "reset to {num_qubits} qubits but buffers only hold {}",
            self.num_qubits
        );
        let state = self.primary.as_mut_slice(num_qubits);
        state.fill(Complex32::new(0.0, 0.0));
        state[0] = Complex32::new(1.0, 0.0);
    }

    /// The primary state truncated to `num_qubits`.
    pub fn primary(&self, num_qubits: u32) -> &[Complex32] {
        self.primary.as_slice(num_qubits)
    }

    /// The primary state truncated to `num_qubits`, mutably.
    pub fn primary_mut(&mut self, num_qubits: u32) -> &mut [Complex32] {
        self.primary.as_mut_slice(num_qubits)
    }

    /// Borrow the primary state and the scratch buffer together.
    pub fn split(&mut self, num_qubits: u32) -> (&[Complex32], &mut [Complex32]) {
        (
            self.primary.as_slice(num_qubits),
            self.scratch.as_mut_slice(num_qubits),
        )
    }

    /// Largest qubit count the buffers currently fit.
    pub fn capacity_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Amplitudes per buffer.
    pub fn capacity(&self) -> usize {
        self.primary.capacity()
    }

    /// Number of reallocations since construction.
    pub fn growths(&self) -> usize {
        self.growths
    }
}
