//! Running a problem's test cases against a candidate kernel.

use crate::config::HarnessConfig;
use crate::report::{CaseResult, EvaluationReport};
use anyhow::{Context, Result};
use kernelbench_kernels::kernel::Kernel;
use kernelbench_kernels::tensor::Tensor;
use kernelbench_problems::{Problem, TestCase};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn evaluate(&self, problem: &dyn Problem, kernel: &dyn Kernel) -> Result<EvaluationReport> {
        let mut cases = Vec::new();
        let mut skipped = Vec::new();

        for case in problem.generate_test_cases() {
            if !self.config.admits(case.num_elements()) {
                info!(
                    case = case.name(),
                    elements = case.num_elements(),
                    max_elements = ?self.config.max_elements,
                    "skipping test case above element cap"
                );
                skipped.push(case.name().to_string());
                continue;
            }
            let result = self
                .run_case(problem, kernel, &case)
                .with_context(|| format!("test case `{}` failed to run", case.name()))?;
            cases.push(result);
        }

        let generated_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_millis();

        Ok(EvaluationReport {
            problem: problem.name().to_string(),
            kernel: kernel.name().to_string(),
            generated_at_unix_ms,
            cases,
            skipped,
        })
    }

    pub fn run_case(
        &self,
        problem: &dyn Problem,
        kernel: &dyn Kernel,
        case: &TestCase,
    ) -> Result<CaseResult> {
        let inputs = case.create_inputs()?;
        let inputs: Vec<&Tensor> = inputs.iter().collect();
        let expected = problem.reference_solution(&inputs)?;
        let mut output = Tensor::zeros(expected.shape(), expected.device());
        let extra = problem.get_extra_params(case);

        {
            let mut call = inputs.clone();
            call.push(&output);
            problem.get_function_signature().check_call(&call, &extra)?;
        }

        for _ in 0..self.config.warmup_runs {
            kernel.launch(&inputs, &mut output, &extra)?;
        }

        let runs = self.config.runs.max(1);
        let mut total = Duration::default();
        for _ in 0..runs {
            // Each timed launch starts from a blank output.
            output.fill(0.0);
            let start = Instant::now();
            kernel.launch(&inputs, &mut output, &extra)?;
            total += start.elapsed();
        }
        let latency_ms = total.as_secs_f64() * 1000.0 / runs as f64;

        let report = problem.verify_result(&expected, &output)?;
        let flops = problem.get_flops(case);
        let gflops = if latency_ms > 0.0 {
            flops as f64 / (latency_ms * 1.0e6)
        } else {
            0.0
        };

        let correct = report.is_correct();
        if let Some(mismatch) = report.diagnostics() {
            warn!(
                case = case.name(),
                kernel = kernel.name(),
                first_index = mismatch.first_index,
                max_abs_diff = mismatch.max_abs_diff,
                "candidate output differs from reference"
            );
        }
        info!(
            case = case.name(),
            kernel = kernel.name(),
            latency_ms,
            gflops,
            correct,
            "test case evaluated"
        );

        Ok(CaseResult {
            case: case.name().to_string(),
            dims: case.dims().to_vec(),
            kernel: kernel.name().to_string(),
            latency_ms,
            flops,
            gflops,
            correct,
            diagnostics: report.into_diagnostics(),
        })
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}
