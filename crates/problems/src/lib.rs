//! Benchmark problems for kernelbench.
//!
//! A problem owns everything the runner needs to judge a candidate kernel:
//! the workload tiers and their inputs, a trusted reference computation,
//! tolerance-based verification, the foreign calling convention and the
//! FLOP count used for throughput scoring.

pub mod config;
pub mod problem;
pub mod registry;
pub mod report;
pub mod tolerance;
pub mod vector_addition;

pub use config::ProblemOptions;
pub use problem::{DynProblem, InputFactory, Problem, ProblemInfo, TestCase};
pub use registry::ProblemRegistry;
pub use report::{Mismatch, VerificationReport};
pub use tolerance::Tolerance;
pub use vector_addition::VectorAddition;
