//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ExpectError, ExpectResult};

/// Largest fused block the fuser will build.
pub const MAX_FUSED_QUBITS_LIMIT: usize = 4;

/// Gate fusion settings used while preparing circuits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Maximum number of qubits a fused block may span. `1` disables
    /// fusion across qubits but still merges runs on the same qubit.
    pub max_fused_qubits: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            max_fused_qubits: 2,
        }
    }
}

/// Configuration of an [`ExpectationEngine`](crate::ExpectationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse circuits wider than this.
    pub max_qubits: u32,
    /// Number of independent buffer pairs used by `run_parallel`.
    pub devices: usize,
    /// Imaginary residue of an observable's accumulated value above which a
    /// warning is logged.
    pub imag_tolerance: f64,
    /// Gate fusion settings.
    pub fusion: FusionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_qubits: 30,
            devices: 1,
            imag_tolerance: 1e-4,
            fusion: FusionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the qubit limit.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Set the number of parallel buffer pairs.
    #[must_use]
    pub fn with_devices(mut self, devices: usize) -> Self {
        self.devices = devices;
        self
    }

    /// Set the fusion width.
    #[must_use]
    pub fn with_max_fused_qubits(mut self, max_fused_qubits: usize) -> Self {
        self.fusion.max_fused_qubits = max_fused_qubits;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> ExpectResult<()> {
        // 2^max_qubits amplitudes must be addressable.
        if self.max_qubits == 0 || self.max_qubits >= usize::BITS - 4 {
            return Err(ExpectError::Config(format!(
                "max_qubits must be in 1..{}, got {}",
                usize::BITS - 4,
                self.max_qubits
            )));
        }
        if self.devices == 0 {
            return Err(ExpectError::Config("devices must be at least 1".into()));
        }
        if !(self.imag_tolerance.is_finite() && self.imag_tolerance >= 0.0) {
            return Err(ExpectError::Config(format!(
                "imag_tolerance must be a non-negative number, got {}",
                self.imag_tolerance
            )));
        }
        if !(1..=MAX_FUSED_QUBITS_LIMIT).contains(&self.fusion.max_fused_qubits) {
            return Err(ExpectError::Config(format!(
                "fusion.max_fused_qubits must be in 1..={MAX_FUSED_QUBITS_LIMIT}, got {}",
                self.fusion.max_fused_qubits
            )));
        }
        Ok(())
    }

    /// Parse a configuration from JSON or YAML text, chosen by `format`
    /// (`"json"`, `"yaml"` or `"yml"`).
    pub fn from_str_with_format(source: &str, format: &str) -> ExpectResult<Self> {
        let config: Self = match format.to_lowercase().as_str() {
            "json" => serde_json::from_str(source)
                .map_err(|e| ExpectError::Config(format!("JSON parse error: {e}")))?,
            "yaml" | "yml" => serde_yaml_ng::from_str(source)
                .map_err(|e| ExpectError::Config(format!("YAML parse error: {e}")))?,
            other => {
                return Err(ExpectError::Config(format!(
                    "unsupported config format '{other}'"
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; the format follows the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> ExpectResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ExpectError::Config(format!("cannot read {}: {e}", path.display())))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
        Self::from_str_with_format(&source, ext)
    }
}
