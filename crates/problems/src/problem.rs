//! The contract every benchmark problem implements.

use crate::report::VerificationReport;
use anyhow::Result;
use kernelbench_kernels::abi::{FunctionSignature, ScalarArg};
use kernelbench_kernels::tensor::Tensor;
use std::fmt;
use std::sync::Arc;

/// Deferred input producer. Captures are owned, so a factory stays valid
/// independently of the scope that enumerated the test cases.
pub type InputFactory = Arc<dyn Fn() -> Result<Vec<Tensor>> + Send + Sync>;

/// One workload instance: a size tier plus the means to materialize it.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    dims: Vec<usize>,
    create_inputs: InputFactory,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, dims: Vec<usize>, create_inputs: F) -> Self
    where
        F: Fn() -> Result<Vec<Tensor>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dims,
            create_inputs: Arc::new(create_inputs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Materialize the inputs. Nothing is allocated until this is called.
    pub fn create_inputs(&self) -> Result<Vec<Tensor>> {
        (self.create_inputs)()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

/// Identity supplied when a problem is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemInfo {
    pub name: String,
    pub description: String,
}

impl ProblemInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

pub trait Problem: Send + Sync {
    fn info(&self) -> &ProblemInfo;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn description(&self) -> &str {
        &self.info().description
    }

    /// Ordered, finite list of workload tiers.
    fn generate_test_cases(&self) -> Vec<TestCase>;

    /// Ground-truth output for `inputs`. Inputs are never mutated; shape or
    /// dtype disagreement between them is an error.
    fn reference_solution(&self, inputs: &[&Tensor]) -> Result<Tensor>;

    /// Compare a candidate output against the reference. A numerical
    /// mismatch is reported in the returned value; only incomparable
    /// tensors produce an error.
    fn verify_result(&self, expected: &Tensor, actual: &Tensor) -> Result<VerificationReport>;

    /// Calling convention a candidate kernel must export.
    fn get_function_signature(&self) -> FunctionSignature;

    fn get_flops(&self, test_case: &TestCase) -> u64;

    /// Scalars appended after the tensor pointers when invoking a candidate.
    fn get_extra_params(&self, test_case: &TestCase) -> Vec<ScalarArg>;
}

pub type DynProblem = Arc<dyn Problem>;

#[cfg(test)]
mod tests {
    use super::*;
    use kernelbench_kernels::config::Device;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn inputs_are_created_lazily() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let case = TestCase::new("tiny", vec![3], move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Tensor::zeros(&[3], Device::Cpu)])
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let inputs = case.create_inputs().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(case.num_elements(), 3);
    }

    #[test]
    fn debug_omits_factory() {
        let case = TestCase::new("tiny", vec![2, 2], || Ok(Vec::new()));
        let rendered = format!("{:?}", case);
        assert!(rendered.contains("tiny"));
        assert!(rendered.contains("[2, 2]"));
    }
}
