//! Candidate kernels loaded from shared libraries.
//!
//! A foreign kernel is an exported C routine taking the input buffer
//! pointers, the output buffer pointer and then `size_t` scalars, returning
//! nothing. The problem's [`FunctionSignature`] decides which of the
//! supported shapes the symbol is called through.

use anyhow::{bail, ensure, Context, Result};
use kernelbench_kernels::abi::{AbiType, FunctionSignature, ScalarArg};
use kernelbench_kernels::config::DataType;
use kernelbench_kernels::kernel::Kernel;
use kernelbench_kernels::tensor::Tensor;
use libloading::Library;
use std::ffi::c_void;
use std::path::Path;
use tracing::info;

/// Entry point name looked up when the caller does not pick one.
pub const DEFAULT_SYMBOL: &str = "solution";

type Unary1 = unsafe extern "C" fn(*const f32, *mut f32, usize);
type Unary2 = unsafe extern "C" fn(*const f32, *mut f32, usize, usize);
type Unary3 = unsafe extern "C" fn(*const f32, *mut f32, usize, usize, usize);
type Binary1 = unsafe extern "C" fn(*const f32, *const f32, *mut f32, usize);
type Binary2 = unsafe extern "C" fn(*const f32, *const f32, *mut f32, usize, usize);
type Binary3 = unsafe extern "C" fn(*const f32, *const f32, *mut f32, usize, usize, usize);
type Ternary1 = unsafe extern "C" fn(*const f32, *const f32, *const f32, *mut f32, usize);
type Ternary2 = unsafe extern "C" fn(*const f32, *const f32, *const f32, *mut f32, usize, usize);
type Ternary3 =
    unsafe extern "C" fn(*const f32, *const f32, *const f32, *mut f32, usize, usize, usize);

pub struct ForeignKernel {
    name: String,
    signature: FunctionSignature,
    entry: *const c_void,
    // Keeps `entry` mapped for as long as the kernel exists.
    _library: Option<Library>,
}

// SAFETY: `entry` is an immutable code address; the library handle is only
// held, never used after construction.
unsafe impl Send for ForeignKernel {}
unsafe impl Sync for ForeignKernel {}

impl ForeignKernel {
    /// Load `symbol` from the shared library at `path`.
    pub fn load(path: impl AsRef<Path>, symbol: &str, signature: FunctionSignature) -> Result<Self> {
        let path = path.as_ref();
        validate_signature(&signature)?;

        // SAFETY: loading runs the library's initializers; the caller chose
        // to trust this library by naming it as a candidate.
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("failed to load kernel library {}", path.display()))?;
        // SAFETY: only the address is read here; it is called later through
        // the type the validated signature selects.
        let entry = unsafe {
            let function = library
                .get::<unsafe extern "C" fn()>(symbol.as_bytes())
                .with_context(|| {
                    format!("symbol `{}` not found in {}", symbol, path.display())
                })?;
            *function as *const c_void
        };

        info!(path = %path.display(), symbol, %signature, "loaded foreign kernel");
        Ok(Self {
            name: format!("{}:{}", path.display(), symbol),
            signature,
            entry,
            _library: Some(library),
        })
    }

    /// Wrap an in-process routine.
    ///
    /// # Safety
    ///
    /// `entry` must point to an `extern "C"` function whose parameters match
    /// `signature` exactly and which stays valid for the kernel's lifetime.
    pub unsafe fn from_raw(
        name: impl Into<String>,
        entry: *const c_void,
        signature: FunctionSignature,
    ) -> Result<Self> {
        ensure!(!entry.is_null(), "foreign kernel entry point is null");
        validate_signature(&signature)?;
        Ok(Self {
            name: name.into(),
            signature,
            entry,
            _library: None,
        })
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

/// Shapes this loader can call: one to three `f32` inputs, one `f32`
/// output, then one to three `size_t` scalars, returning nothing.
fn validate_signature(signature: &FunctionSignature) -> Result<()> {
    ensure!(
        signature.restype.is_none(),
        "foreign kernels must return nothing, signature is {}",
        signature
    );
    ensure!(
        signature.is_pointers_then_scalars(),
        "foreign kernel signature {} must list pointers before scalars",
        signature
    );
    ensure!(
        signature.argtypes[..signature.pointer_count()]
            .iter()
            .all(|ty| *ty == AbiType::Pointer(DataType::F32)),
        "foreign kernel signature {} uses a pointer type other than *f32",
        signature
    );
    ensure!(
        signature.scalar_types().iter().all(|ty| *ty == AbiType::SizeT),
        "foreign kernel signature {} uses a scalar type other than size_t",
        signature
    );
    ensure!(
        (2..=4).contains(&signature.pointer_count()) && (1..=3).contains(&signature.scalar_count()),
        "unsupported foreign calling convention {}",
        signature
    );
    Ok(())
}

impl Kernel for ForeignKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn launch(&self, inputs: &[&Tensor], output: &mut Tensor, extra: &[ScalarArg]) -> Result<()> {
        {
            let mut tensors = inputs.to_vec();
            tensors.push(&*output);
            self.signature.check_call(&tensors, extra)?;
        }
        let n = extra.first().map(ScalarArg::as_usize).unwrap_or(0);
        for (idx, input) in inputs.iter().enumerate() {
            ensure!(
                input.len() >= n,
                "input {} holds {} elements but the kernel is told N = {}",
                idx,
                input.len(),
                n
            );
        }
        ensure!(
            output.len() >= n,
            "output holds {} elements but the kernel is told N = {}",
            output.len(),
            n
        );

        let ins: Vec<*const f32> = inputs.iter().map(|tensor| tensor.as_ptr()).collect();
        let sizes: Vec<usize> = extra.iter().map(ScalarArg::as_usize).collect();
        let out = output.as_mut_ptr();

        // SAFETY: the signature was validated at construction and the
        // arguments were checked against it above, so the transmuted type
        // matches the routine and every buffer holds at least N elements.
        unsafe {
            match (ins.as_slice(), sizes.as_slice()) {
                ([a], [n]) => std::mem::transmute::<*const c_void, Unary1>(self.entry)(*a, out, *n),
                ([a], [n, m]) => {
                    std::mem::transmute::<*const c_void, Unary2>(self.entry)(*a, out, *n, *m)
                }
                ([a], [n, m, k]) => {
                    std::mem::transmute::<*const c_void, Unary3>(self.entry)(*a, out, *n, *m, *k)
                }
                ([a, b], [n]) => {
                    std::mem::transmute::<*const c_void, Binary1>(self.entry)(*a, *b, out, *n)
                }
                ([a, b], [n, m]) => {
                    std::mem::transmute::<*const c_void, Binary2>(self.entry)(*a, *b, out, *n, *m)
                }
                ([a, b], [n, m, k]) => std::mem::transmute::<*const c_void, Binary3>(self.entry)(
                    *a, *b, out, *n, *m, *k,
                ),
                ([a, b, c], [n]) => {
                    std::mem::transmute::<*const c_void, Ternary1>(self.entry)(*a, *b, *c, out, *n)
                }
                ([a, b, c], [n, m]) => std::mem::transmute::<*const c_void, Ternary2>(self.entry)(
                    *a, *b, *c, out, *n, *m,
                ),
                ([a, b, c], [n, m, k]) => std::mem::transmute::<*const c_void, Ternary3>(
                    self.entry,
                )(*a, *b, *c, out, *n, *m, *k),
                _ => bail!("unsupported foreign calling convention {}", self.signature),
            }
        }
        Ok(())
    }
}
