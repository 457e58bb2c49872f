//! Calling-convention descriptors for foreign kernels.
//!
//! A [`FunctionSignature`] is the single description both sides agree on:
//! the problem declares it, the runner marshals arguments against it, and
//! a foreign kernel must export a routine of exactly this shape.

use crate::config::DataType;
use crate::tensor::Tensor;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiType {
    /// Pointer to a contiguous buffer of the given element type.
    Pointer(DataType),
    /// Unsigned, pointer-sized integer (`size_t`).
    SizeT,
}

impl AbiType {
    pub fn is_pointer(&self) -> bool {
        matches!(self, AbiType::Pointer(_))
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Pointer(dtype) => write!(f, "*{}", dtype),
            AbiType::SizeT => f.write_str("size_t"),
        }
    }
}

/// Non-tensor argument appended after the tensor pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarArg {
    Size(usize),
}

impl ScalarArg {
    pub fn abi_type(&self) -> AbiType {
        match self {
            ScalarArg::Size(_) => AbiType::SizeT,
        }
    }

    pub fn as_usize(&self) -> usize {
        match self {
            ScalarArg::Size(value) => *value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub argtypes: Vec<AbiType>,
    /// `None` for routines returning nothing.
    pub restype: Option<AbiType>,
}

impl FunctionSignature {
    pub fn new(argtypes: Vec<AbiType>, restype: Option<AbiType>) -> Self {
        Self { argtypes, restype }
    }

    /// Number of leading pointer parameters (inputs followed by outputs).
    pub fn pointer_count(&self) -> usize {
        self.argtypes.iter().take_while(|ty| ty.is_pointer()).count()
    }

    /// Number of trailing scalar parameters.
    pub fn scalar_count(&self) -> usize {
        self.argtypes.len() - self.pointer_count()
    }

    /// All pointers come first, followed only by scalars.
    pub fn is_pointers_then_scalars(&self) -> bool {
        self.argtypes[self.pointer_count()..]
            .iter()
            .all(|ty| !ty.is_pointer())
    }

    pub fn scalar_types(&self) -> &[AbiType] {
        &self.argtypes[self.pointer_count()..]
    }

    /// Check that `tensors` (inputs then output) and `extra` line up with
    /// this signature in count, order and element type.
    pub fn check_call(&self, tensors: &[&Tensor], extra: &[ScalarArg]) -> Result<()> {
        ensure!(
            self.is_pointers_then_scalars(),
            "signature {} interleaves pointers and scalars",
            self
        );
        ensure!(
            tensors.len() == self.pointer_count(),
            "signature {} expects {} tensor pointers, got {}",
            self,
            self.pointer_count(),
            tensors.len()
        );
        for (idx, (tensor, ty)) in tensors.iter().zip(&self.argtypes).enumerate() {
            ensure!(
                *ty == AbiType::Pointer(tensor.dtype()),
                "argument {} is declared as {} but the tensor holds {}",
                idx,
                ty,
                tensor.dtype()
            );
        }
        ensure!(
            extra.len() == self.scalar_count(),
            "signature {} expects {} scalar parameters, got {}",
            self,
            self.scalar_count(),
            extra.len()
        );
        for (idx, (arg, ty)) in extra.iter().zip(self.scalar_types()).enumerate() {
            ensure!(
                arg.abi_type() == *ty,
                "scalar parameter {} is declared as {} but {:?} was supplied",
                idx,
                ty,
                arg
            );
        }
        Ok(())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.restype {
            Some(ty) => write!(f, "{}", ty)?,
            None => f.write_str("void")?,
        }
        f.write_str(" (")?;
        for (idx, ty) in self.argtypes.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        f.write_str(")")
    }
}
