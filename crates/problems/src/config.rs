//! Options shared by every problem.

use crate::tolerance::Tolerance;
use kernelbench_kernels::config::Device;
use serde::{Deserialize, Serialize};

/// Seed used when the caller does not choose one.
pub const DEFAULT_SEED: u64 = 0x5eed;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemOptions {
    /// Device generated inputs are placed on.
    pub device: Device,
    /// Base seed for input generation. `None` draws fresh entropy on every
    /// `create_inputs` call.
    pub seed: Option<u64>,
    pub tolerance: Tolerance,
}

impl Default for ProblemOptions {
    fn default() -> Self {
        Self {
            device: Device::Cuda,
            seed: Some(DEFAULT_SEED),
            tolerance: Tolerance::default(),
        }
    }
}
