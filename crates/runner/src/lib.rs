//! Evaluation harness for kernelbench.
//!
//! Drives a [`Problem`](kernelbench_problems::Problem) against a candidate
//! [`Kernel`](kernelbench_kernels::Kernel): materializes each test case,
//! times the candidate, checks it against the reference and scores
//! throughput from the problem's FLOP count.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod eval;
pub mod ffi;
pub mod report;

#[cfg(feature = "cli")]
pub use cli::*;
pub use config::*;
pub use eval::*;
pub use ffi::*;
pub use report::*;
