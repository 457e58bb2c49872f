//! Vector addition: `C = A + B` over `f32` vectors.

use crate::config::ProblemOptions;
use crate::problem::{Problem, ProblemInfo, TestCase};
use crate::report::VerificationReport;
use anyhow::{bail, ensure, Result};
use kernelbench_kernels::abi::{AbiType, FunctionSignature, ScalarArg};
use kernelbench_kernels::config::{DataType, Device};
use kernelbench_kernels::tensor::Tensor;
use ndarray::Zip;
use tracing::debug;

/// Size tiers, smallest first.
pub const VECTOR_ADDITION_TIERS: [(&str, usize); 6] = [
    ("1M elements", 1_000_000),
    ("5M elements", 5_000_000),
    ("10M elements", 10_000_000),
    ("50M elements", 50_000_000),
    ("100M elements", 100_000_000),
    ("1B elements", 1_000_000_000),
];

pub struct VectorAddition {
    info: ProblemInfo,
    options: ProblemOptions,
}

impl VectorAddition {
    pub fn new() -> Self {
        Self::with_options(ProblemOptions::default())
    }

    pub fn with_options(options: ProblemOptions) -> Self {
        Self {
            info: ProblemInfo::new(
                "vector-addition",
                "Implement a CUDA kernel for vector addition: C = A + B",
            ),
            options,
        }
    }

    pub fn options(&self) -> &ProblemOptions {
        &self.options
    }

    /// Elementwise `a + b` into a new tensor on `a`'s device.
    pub fn add(&self, a: &Tensor, b: &Tensor) -> Result<Tensor> {
        ensure!(
            a.is_comparable(b),
            "vector addition operands disagree: {:?} ({}) vs {:?} ({})",
            a.shape(),
            a.dtype(),
            b.shape(),
            b.dtype()
        );
        ensure!(
            a.device() == b.device(),
            "vector addition operands live on different devices: {} vs {}",
            a.device(),
            b.device()
        );
        let sum = Zip::from(a.array())
            .and(b.array())
            .par_map_collect(|&x, &y| x + y);
        Ok(Tensor::from_array(sum, a.device()))
    }
}

impl Default for VectorAddition {
    fn default() -> Self {
        Self::new()
    }
}

/// Two uniform `[0, 1)` vectors of `size` elements.
///
/// With a base seed, each tier draws from its own reproducible stream;
/// without one every call sees fresh entropy.
fn tier_inputs(size: usize, device: Device, seed: Option<u64>) -> Result<Vec<Tensor>> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed ^ size as u64),
        None => fastrand::Rng::new(),
    };
    let dims = [size];
    let a = Tensor::random(&dims, device, rng.u64(..))?;
    let b = Tensor::random(&dims, device, rng.u64(..))?;
    Ok(vec![a, b])
}

fn element_count(test_case: &TestCase) -> usize {
    test_case.dims().first().copied().unwrap_or(0)
}

impl Problem for VectorAddition {
    fn info(&self) -> &ProblemInfo {
        &self.info
    }

    fn generate_test_cases(&self) -> Vec<TestCase> {
        let ProblemOptions { device, seed, .. } = self.options;
        VECTOR_ADDITION_TIERS
            .iter()
            .map(|&(name, size)| {
                TestCase::new(name, vec![size], move || {
                    debug!(case = name, elements = size, %device, "materializing inputs");
                    tier_inputs(size, device, seed)
                })
            })
            .collect()
    }

    fn reference_solution(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        match inputs {
            [a, b] => self.add(a, b),
            other => bail!("vector addition takes 2 inputs, got {}", other.len()),
        }
    }

    fn verify_result(&self, expected: &Tensor, actual: &Tensor) -> Result<VerificationReport> {
        self.options.tolerance.compare(expected, actual)
    }

    fn get_function_signature(&self) -> FunctionSignature {
        FunctionSignature::new(
            vec![
                AbiType::Pointer(DataType::F32), // input_a
                AbiType::Pointer(DataType::F32), // input_b
                AbiType::Pointer(DataType::F32), // output
                AbiType::SizeT,                  // N
            ],
            None,
        )
    }

    /// One addition per output element.
    fn get_flops(&self, test_case: &TestCase) -> u64 {
        element_count(test_case) as u64
    }

    fn get_extra_params(&self, test_case: &TestCase) -> Vec<ScalarArg> {
        vec![ScalarArg::Size(element_count(test_case))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vector(values: &[f32]) -> Tensor {
        Tensor::from_vec(&[values.len()], values.to_vec(), Device::Cuda).unwrap()
    }

    #[test]
    fn identity() {
        let problem = VectorAddition::new();
        assert_eq!(problem.name(), "vector-addition");
        assert!(problem.description().contains("C = A + B"));
    }

    #[test]
    fn six_increasing_tiers() {
        let cases = VectorAddition::new().generate_test_cases();
        let sizes: Vec<usize> = cases.iter().map(|case| case.dims()[0]).collect();
        assert_eq!(
            sizes,
            vec![1_000_000, 5_000_000, 10_000_000, 50_000_000, 100_000_000, 1_000_000_000]
        );
        assert!(cases.iter().all(|case| case.dims().len() == 1));
        assert_eq!(cases[0].name(), "1M elements");
        assert_eq!(cases[5].name(), "1B elements");
    }

    #[test]
    fn enumeration_is_idempotent() {
        let problem = VectorAddition::new();
        let first = problem.generate_test_cases();
        let second = problem.generate_test_cases();
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.dims(), b.dims());
        }
    }

    #[test]
    fn flops_and_extra_params_follow_dims() {
        let problem = VectorAddition::new();
        for case in problem.generate_test_cases() {
            assert_eq!(problem.get_flops(&case), case.dims()[0] as u64);
            assert_eq!(
                problem.get_extra_params(&case),
                vec![ScalarArg::Size(case.dims()[0])]
            );
        }
    }

    #[test]
    fn signature_matches_inputs_and_extra_params() {
        let problem = VectorAddition::new();
        let signature = problem.get_function_signature();
        assert_eq!(signature.pointer_count(), 3);
        assert_eq!(signature.restype, None);

        let case = TestCase::new("small", vec![16], || tier_inputs(16, Device::Cuda, Some(1)));
        let inputs = case.create_inputs().unwrap();
        let output = Tensor::zeros(&[16], Device::Cuda);
        let mut call: Vec<&Tensor> = inputs.iter().collect();
        call.push(&output);
        signature
            .check_call(&call, &problem.get_extra_params(&case))
            .unwrap();
    }

    #[test]
    fn smallest_tier_inputs() {
        let problem = VectorAddition::new();
        let case = &problem.generate_test_cases()[0];
        let inputs = case.create_inputs().unwrap();
        assert_eq!(inputs.len(), 2);
        for input in &inputs {
            assert_eq!(input.shape(), &[1_000_000]);
            assert_eq!(input.dtype(), DataType::F32);
            assert_eq!(input.device(), Device::Cuda);
        }
        assert_ne!(inputs[0], inputs[1]);
    }

    #[test]
    fn seeded_inputs_are_reproducible() {
        let seeded = tier_inputs(1024, Device::Cpu, Some(42)).unwrap();
        let again = tier_inputs(1024, Device::Cpu, Some(42)).unwrap();
        assert_eq!(seeded, again);

        let fresh = tier_inputs(1024, Device::Cpu, None).unwrap();
        let fresh_again = tier_inputs(1024, Device::Cpu, None).unwrap();
        assert_ne!(fresh, fresh_again);
    }

    #[test]
    fn reference_adds_without_mutating_inputs() {
        let problem = VectorAddition::new();
        let a = vector(&[1.0, 2.0, 3.0]);
        let b = vector(&[10.0, 20.0, 30.0]);
        let sum = problem.reference_solution(&[&a, &b]).unwrap();

        assert_eq!(sum.as_slice(), &[11.0, 22.0, 33.0]);
        assert_eq!(sum.device(), Device::Cuda);
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(b.as_slice(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn reference_matches_elementwise_sum_on_random_inputs() {
        let problem = VectorAddition::new();
        let inputs = tier_inputs(4096, Device::Cpu, Some(9)).unwrap();
        let sum = problem.reference_solution(&[&inputs[0], &inputs[1]]).unwrap();
        for ((s, a), b) in sum
            .as_slice()
            .iter()
            .zip(inputs[0].as_slice())
            .zip(inputs[1].as_slice())
        {
            assert_abs_diff_eq!(*s, a + b, epsilon = 1e-6);
        }
    }

    #[test]
    fn reference_rejects_contract_violations() {
        let problem = VectorAddition::new();
        let a = vector(&[1.0, 2.0]);
        let b = vector(&[1.0, 2.0, 3.0]);
        assert!(problem.reference_solution(&[&a, &b]).is_err());
        assert!(problem.reference_solution(&[&a]).is_err());

        let host = vector(&[1.0, 2.0]).to_device(Device::Cpu);
        assert!(problem.reference_solution(&[&a, &host]).is_err());
    }

    #[test]
    fn concrete_mismatch_scenario() {
        let problem = VectorAddition::new();
        let a = vector(&[1.0, 2.0, 3.0]);
        let b = vector(&[10.0, 20.0, 30.0]);
        let expected = problem.reference_solution(&[&a, &b]).unwrap();
        let actual = vector(&[11.0, 22.0, 30.0]);

        let report = problem.verify_result(&expected, &actual).unwrap();
        assert!(!report.is_correct());
        let mismatch = report.diagnostics().unwrap();
        assert_eq!(mismatch.first_index, 2);
        assert_eq!(mismatch.actual_window, vec!["30.0000000"]);
        assert_eq!(mismatch.expected_window, vec!["33.0000000"]);
        assert_abs_diff_eq!(mismatch.max_abs_diff, 3.0, epsilon = 1e-7);

        let exact = problem.verify_result(&expected, &expected.clone()).unwrap();
        assert!(exact.is_correct());
        assert!(exact.diagnostics_map().is_empty());
    }
}
