//! Shared argument validation for kernel implementations.

use crate::abi::ScalarArg;
use crate::tensor::Tensor;
use anyhow::{bail, ensure, Result};

/// Element count from a `[N]` scalar parameter list.
pub fn element_count(extra: &[ScalarArg]) -> Result<usize> {
    match extra {
        [ScalarArg::Size(n)] => Ok(*n),
        other => bail!("expected a single element count, got {:?}", other),
    }
}

/// Buffers of an elementwise binary launch must each hold at least `n` elements.
pub fn validate_binary_launch(inputs: &[&Tensor], output: &Tensor, n: usize) -> Result<()> {
    ensure!(
        inputs.len() == 2,
        "elementwise binary kernel expects 2 inputs, got {}",
        inputs.len()
    );
    for (idx, input) in inputs.iter().enumerate() {
        ensure!(
            input.len() >= n,
            "input {} holds {} elements but N = {}",
            idx,
            input.len(),
            n
        );
    }
    ensure!(
        output.len() >= n,
        "output holds {} elements but N = {}",
        output.len(),
        n
    );
    Ok(())
}
