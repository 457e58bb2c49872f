//! Host-side vector addition candidates.

use crate::abi::ScalarArg;
use crate::kernel::Kernel;
use crate::tensor::Tensor;
use crate::utils::{element_count, validate_binary_launch};
use anyhow::Result;
use rayon::prelude::*;

#[derive(Default)]
pub struct SerialVectorAdd;

impl SerialVectorAdd {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for SerialVectorAdd {
    fn name(&self) -> &str {
        "serial"
    }

    fn launch(&self, inputs: &[&Tensor], output: &mut Tensor, extra: &[ScalarArg]) -> Result<()> {
        let n = element_count(extra)?;
        validate_binary_launch(inputs, output, n)?;

        let lhs = &inputs[0].as_slice()[..n];
        let rhs = &inputs[1].as_slice()[..n];
        for ((out, a), b) in output.as_mut_slice()[..n].iter_mut().zip(lhs).zip(rhs) {
            *out = a + b;
        }
        Ok(())
    }
}

pub struct ParallelVectorAdd {
    chunk_size: usize,
}

impl ParallelVectorAdd {
    pub fn new() -> Self {
        Self::with_chunk_size(1 << 14)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for ParallelVectorAdd {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for ParallelVectorAdd {
    fn name(&self) -> &str {
        "parallel"
    }

    fn launch(&self, inputs: &[&Tensor], output: &mut Tensor, extra: &[ScalarArg]) -> Result<()> {
        let n = element_count(extra)?;
        validate_binary_launch(inputs, output, n)?;

        let lhs = &inputs[0].as_slice()[..n];
        let rhs = &inputs[1].as_slice()[..n];
        output.as_mut_slice()[..n]
            .par_chunks_mut(self.chunk_size)
            .zip(lhs.par_chunks(self.chunk_size))
            .zip(rhs.par_chunks(self.chunk_size))
            .for_each(|((out, a), b)| {
                for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
                    *o = x + y;
                }
            });
        Ok(())
    }
}

/// Deliberately wrong: never writes the final element.
///
/// Exists so the failure path of verification can be exercised end to end.
#[derive(Default)]
pub struct OffByOneVectorAdd;

impl OffByOneVectorAdd {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for OffByOneVectorAdd {
    fn name(&self) -> &str {
        "off-by-one"
    }

    fn launch(&self, inputs: &[&Tensor], output: &mut Tensor, extra: &[ScalarArg]) -> Result<()> {
        let n = element_count(extra)?;
        validate_binary_launch(inputs, output, n)?;

        let end = n.saturating_sub(1);
        let lhs = &inputs[0].as_slice()[..end];
        let rhs = &inputs[1].as_slice()[..end];
        for ((out, a), b) in output.as_mut_slice()[..end].iter_mut().zip(lhs).zip(rhs) {
            *out = a + b;
        }
        Ok(())
    }
}
