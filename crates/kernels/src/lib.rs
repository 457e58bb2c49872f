//! Tensors, calling conventions and candidate kernels for kernelbench.

pub mod abi;
pub mod config;
pub mod kernel;
pub mod registry;
pub mod tensor;
pub mod utils;
pub mod vector_add;

pub use abi::*;
pub use config::*;
pub use kernel::*;
pub use registry::*;
pub use tensor::*;
pub use utils::*;
pub use vector_add::*;
