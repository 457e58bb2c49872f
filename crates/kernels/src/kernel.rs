//! The launch interface every candidate kernel exposes.

use crate::abi::ScalarArg;
use crate::tensor::Tensor;
use anyhow::Result;
use std::sync::Arc;

/// A candidate computation invoked in the foreign calling shape: input
/// buffers, one output buffer, then the scalar parameters.
pub trait Kernel: Send + Sync {
    fn name(&self) -> &str;
    fn launch(&self, inputs: &[&Tensor], output: &mut Tensor, extra: &[ScalarArg]) -> Result<()>;
}

pub type DynKernel = Arc<dyn Kernel>;
