//! Kernel registry for lookup and discovery.

use crate::kernel::{DynKernel, Kernel};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct KernelRegistry {
    kernels: Vec<DynKernel>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            kernels: Vec::new(),
        }
    }

    pub fn with_default_vector_add_kernels() -> Self {
        let mut registry = Self::new();
        registry.register(crate::vector_add::SerialVectorAdd::new());
        registry.register(crate::vector_add::ParallelVectorAdd::new());
        registry.register(crate::vector_add::OffByOneVectorAdd::new());
        registry
    }

    pub fn register<K>(&mut self, kernel: K)
    where
        K: Kernel + 'static,
    {
        self.kernels.push(Arc::new(kernel));
    }

    pub fn register_dyn(&mut self, kernel: DynKernel) {
        self.kernels.push(kernel);
    }

    pub fn kernels(&self) -> &[DynKernel] {
        &self.kernels
    }

    pub fn names(&self) -> Vec<&str> {
        self.kernels.iter().map(|kernel| kernel.name()).collect()
    }

    pub fn find(&self, name: &str) -> Option<DynKernel> {
        self.kernels
            .iter()
            .find(|kernel| kernel.name() == name)
            .map(Arc::clone)
    }
}
