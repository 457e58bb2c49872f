//! CLI wiring for the kernelbench harness.

use crate::config::HarnessConfig;
use crate::eval::Harness;
use crate::ffi::{ForeignKernel, DEFAULT_SYMBOL};
use crate::report::EvaluationReport;
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use kernelbench_kernels::config::Device;
use kernelbench_kernels::kernel::DynKernel;
use kernelbench_kernels::registry::KernelRegistry;
use kernelbench_problems::{DynProblem, ProblemRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kernelbench", about = "Benchmark harness for candidate compute kernels")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum DeviceArg {
    Cpu,
    Cuda,
}

impl From<DeviceArg> for Device {
    fn from(value: DeviceArg) -> Device {
        match value {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Cuda => Device::Cuda,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered problems and built-in kernels.
    List,
    /// Print the calling convention a problem expects from candidates.
    Signature {
        #[arg(long, default_value = "vector-addition")]
        problem: String,
    },
    /// Evaluate a candidate kernel against a problem and report throughput.
    Run {
        #[arg(long, default_value = "vector-addition")]
        problem: String,
        /// Built-in kernel name or path to a shared library.
        #[arg(long, default_value = "parallel")]
        kernel: String,
        /// Exported routine to call when `--kernel` is a shared library.
        #[arg(long, default_value = DEFAULT_SYMBOL)]
        symbol: String,
        /// JSON harness configuration; flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        runs: Option<usize>,
        #[arg(long)]
        warmup: Option<usize>,
        #[arg(long, conflicts_with = "all_sizes")]
        max_elements: Option<usize>,
        /// Run every tier regardless of size.
        #[arg(long, default_value_t = false)]
        all_sizes: bool,
        #[arg(long, conflicts_with = "unseeded")]
        seed: Option<u64>,
        /// Draw fresh random inputs on every run.
        #[arg(long, default_value_t = false)]
        unseeded: bool,
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,
        /// Write the JSON report here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::List => {
            let problems = ProblemRegistry::with_default_problems(Default::default());
            println!("problems:");
            for problem in problems.problems() {
                println!("  {:<20} {}", problem.name(), problem.description());
            }
            println!("kernels:");
            for name in KernelRegistry::with_default_vector_add_kernels().names() {
                println!("  {}", name);
            }
        }
        Command::Signature { problem } => {
            let registry = ProblemRegistry::with_default_problems(Default::default());
            let problem = find_problem(&registry, &problem)?;
            let signature = problem.get_function_signature();
            println!("{}", signature);
            println!("{}", serde_json::to_string_pretty(&signature)?);
        }
        Command::Run {
            problem,
            kernel,
            symbol,
            config,
            runs,
            warmup,
            max_elements,
            all_sizes,
            seed,
            unseeded,
            device,
            output,
        } => {
            let mut harness_config = match config {
                Some(path) => HarnessConfig::load(path)?,
                None => HarnessConfig::default(),
            };
            if let Some(runs) = runs {
                harness_config.runs = runs;
            }
            if let Some(warmup) = warmup {
                harness_config.warmup_runs = warmup;
            }
            if all_sizes {
                harness_config.max_elements = None;
            } else if max_elements.is_some() {
                harness_config.max_elements = max_elements;
            }
            if unseeded {
                harness_config.problem.seed = None;
            } else if seed.is_some() {
                harness_config.problem.seed = seed;
            }
            if let Some(device) = device {
                harness_config.problem.device = device.into();
            }

            let registry = ProblemRegistry::with_default_problems(harness_config.problem);
            let problem = find_problem(&registry, &problem)?;
            let kernel = resolve_kernel(&kernel, &symbol, &problem)?;

            info!(
                problem = problem.name(),
                kernel = kernel.name(),
                runs = harness_config.runs,
                warmup = harness_config.warmup_runs,
                "starting evaluation"
            );
            let harness = Harness::new(harness_config);
            let report = harness.evaluate(problem.as_ref(), kernel.as_ref())?;
            print_report(&report);

            if let Some(path) = output {
                report.save(path)?;
            }

            let failed = report.failures().count();
            if failed > 0 {
                bail!(
                    "{} of {} test cases failed verification",
                    failed,
                    report.cases.len()
                );
            }
        }
    }
    Ok(())
}

fn find_problem(registry: &ProblemRegistry, name: &str) -> Result<DynProblem> {
    registry.find(name).ok_or_else(|| {
        anyhow!(
            "unknown problem `{}`; available: {}",
            name,
            registry.names().join(", ")
        )
    })
}

/// A registered kernel name, or else a shared library path.
fn resolve_kernel(name: &str, symbol: &str, problem: &DynProblem) -> Result<DynKernel> {
    let registry = KernelRegistry::with_default_vector_add_kernels();
    if let Some(kernel) = registry.find(name) {
        return Ok(kernel);
    }
    let path = Path::new(name);
    if !path.exists() {
        bail!(
            "`{}` is neither a built-in kernel ({}) nor an existing library path",
            name,
            registry.names().join(", ")
        );
    }
    let kernel = ForeignKernel::load(path, symbol, problem.get_function_signature())?;
    Ok(Arc::new(kernel))
}

fn print_report(report: &EvaluationReport) {
    println!(
        "problem={}, kernel={}, cases={}, skipped={}",
        report.problem,
        report.kernel,
        report.cases.len(),
        report.skipped.len()
    );
    for case in &report.cases {
        println!(
            "- {}: latency_ms={:.3} gflops={:.3} correct={}",
            case.case, case.latency_ms, case.gflops, case.correct
        );
        if let Some(mismatch) = &case.diagnostics {
            println!(
                "    first differing index={} actual={:?} expected={:?} max_abs_diff={}",
                mismatch.first_index,
                mismatch.actual_window,
                mismatch.expected_window,
                mismatch.max_abs_diff
            );
        }
    }
    for name in &report.skipped {
        println!("- {}: skipped (above element cap)", name);
    }
}
