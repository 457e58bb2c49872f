//! Dense tensors handed to reference and candidate computations.
//!
//! Storage is always a contiguous, row-major host buffer of `f32`. The
//! [`Device`] tag records where the runner is expected to stage the buffer
//! before a foreign call; it does not change how the data is held here.

use crate::config::{DataType, Device};
use anyhow::{ensure, Result};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use rayon::prelude::*;

/// Elements generated per random stream in [`Tensor::random`].
const RANDOM_CHUNK: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: ArrayD<f32>,
    device: Device,
}

impl Tensor {
    pub fn zeros(dims: &[usize], device: Device) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(dims)),
            device,
        }
    }

    pub fn from_vec(dims: &[usize], data: Vec<f32>, device: Device) -> Result<Self> {
        let expected: usize = dims.iter().product();
        ensure!(
            data.len() == expected,
            "tensor data length {} does not match shape {:?}",
            data.len(),
            dims
        );
        let data = ArrayD::from_shape_vec(IxDyn(dims), data)?;
        Ok(Self { data, device })
    }

    /// Wrap an existing array, copying it into standard layout if needed.
    pub fn from_array(data: ArrayD<f32>, device: Device) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data, device }
    }

    /// Uniform samples in `[0, 1)`.
    ///
    /// The buffer is filled in parallel, one generator per chunk, with every
    /// chunk seeded from `seed` and its position. The same seed therefore
    /// yields the same tensor regardless of thread count.
    pub fn random(dims: &[usize], device: Device, seed: u64) -> Result<Self> {
        let len: usize = dims.iter().product();
        let mut values = vec![0.0f32; len];
        values
            .par_chunks_mut(RANDOM_CHUNK)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let stream = (chunk_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                let mut rng = fastrand::Rng::with_seed(seed ^ stream);
                chunk.iter_mut().for_each(|value| *value = rng.f32());
            });
        Self::from_vec(dims, values, device)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DataType {
        DataType::F32
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn size_bytes(&self) -> usize {
        self.len() * self.dtype().element_size_bytes()
    }

    /// Same data, retagged for another device.
    pub fn to_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Two tensors can be compared elementwise only with identical shape and dtype.
    pub fn is_comparable(&self, other: &Tensor) -> bool {
        self.shape() == other.shape() && self.dtype() == other.dtype()
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    pub fn array(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data.as_slice().unwrap_or_default()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_slice_mut().unwrap_or_default()
    }

    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }
}
