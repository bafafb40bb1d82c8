//! Simulated Householder reflector generation kernel
//!
//! Device-side counterpart of the host reference in [`crate::reference`].
//! Computes `beta`, `tau`, and the reflector vector `v` such that
//! `(I - tau * v * v^T) * [alpha; x] = [beta; 0]`, overwriting `alpha` with
//! `beta` and `x` with `v`.
//!
//! The norm reduction runs in two passes the way a GPU kernel would: one
//! block-wise pass writing partial sums of squares into scratch memory,
//! then a pass accumulating the partials. The summation order therefore
//! differs from the host reference, which is exactly the kind of rounding
//! disagreement the correctness evaluator exists to quantify.

use std::mem;

use super::{KernelStatus, ReflectorKernel};
use crate::driver::{DevPtr, DeviceBuffer, DeviceContext, Heap};
use crate::element::Element;

/// Reduction block width, matching a typical one-warp-per-block layout
const DEFAULT_BLOCK: usize = 256;

/// Simulated device kernel for reflector generation
///
/// # Example
///
/// ```
/// use comprobar::driver::DeviceContext;
/// use comprobar::kernels::{KernelStatus, ReflectorKernel, SimLarfg};
///
/// let ctx = DeviceContext::new();
/// let kernel = SimLarfg::new();
/// // Degenerate size quick-returns success even with all-null data.
/// let status =
///     <SimLarfg as ReflectorKernel<f32>>::launch(&kernel, Some(&ctx), 0, None, None, 1, None);
/// assert_eq!(status, KernelStatus::Success);
/// ```
#[derive(Debug, Clone)]
pub struct SimLarfg {
    block: usize,
}

impl Default for SimLarfg {
    fn default() -> Self {
        Self::new()
    }
}

impl SimLarfg {
    /// Create a kernel with the default reduction block width
    #[must_use]
    pub fn new() -> Self {
        Self {
            block: DEFAULT_BLOCK,
        }
    }

    /// Create a kernel with an explicit reduction block width
    #[must_use]
    pub fn with_block(block: usize) -> Self {
        Self {
            block: block.max(1),
        }
    }

    /// Scratch bytes needed for a problem of size `n`: one partial sum per
    /// reduction block
    fn workspace_bytes<T>(&self, n: i64) -> usize {
        if n <= 1 {
            return 0;
        }
        let m = (n - 1) as usize;
        m.div_ceil(self.block) * mem::size_of::<T>()
    }
}

impl<T: Element> ReflectorKernel<T> for SimLarfg {
    fn name(&self) -> &str {
        "larfg_sim"
    }

    fn launch(
        &self,
        ctx: Option<&DeviceContext>,
        n: i64,
        alpha: Option<&DeviceBuffer<T>>,
        x: Option<&DeviceBuffer<T>>,
        incx: i64,
        tau: Option<&DeviceBuffer<T>>,
    ) -> KernelStatus {
        let Some(ctx) = ctx else {
            return KernelStatus::InvalidHandle;
        };
        if n < 0 || incx < 1 {
            return KernelStatus::InvalidSize;
        }
        if ctx.size_query_active() {
            ctx.record_workspace(self.workspace_bytes::<T>(n));
            return KernelStatus::Success;
        }
        // quick return ahead of pointer validation
        if n == 0 {
            return KernelStatus::Success;
        }
        let (Some(alpha), Some(x), Some(tau)) = (alpha, x, tau) else {
            return KernelStatus::InvalidPointer;
        };

        let m = (n - 1) as usize;
        let inc = incx as usize;
        let block = self.block;
        let a_ptr = alpha.ptr();
        let x_ptr = x.ptr();
        let t_ptr = tau.ptr();
        let (ws_addr, ws_bytes) = ctx.workspace_raw();
        ctx.enqueue(Box::new(move |heap| {
            larfg_body::<T>(heap, m, inc, a_ptr, x_ptr, t_ptr, block, ws_addr, ws_bytes)
        }));
        KernelStatus::Success
    }
}

/// Kernel body, run when the stream drains
#[allow(clippy::too_many_arguments)]
fn larfg_body<T: Element>(
    heap: &mut Heap,
    m: usize,
    inc: usize,
    a_ptr: DevPtr<T>,
    x_ptr: DevPtr<T>,
    t_ptr: DevPtr<T>,
    block: usize,
    ws_addr: u64,
    ws_bytes: usize,
) -> std::result::Result<(), String> {
    let alpha0 = heap.slice(a_ptr, 1)?[0];

    let sumsq = if m == 0 {
        T::ZERO
    } else {
        let blocks = m.div_ceil(block);
        let need = blocks * mem::size_of::<T>();

        // pass 1: block-wise partial sums of squares
        let mut partials = vec![T::ZERO; blocks];
        {
            let xs = heap.slice(x_ptr, (m - 1) * inc + 1)?;
            for (b, partial) in partials.iter_mut().enumerate() {
                let mut acc = T::ZERO;
                for i in (b * block)..((b + 1) * block).min(m) {
                    let v = xs[i * inc];
                    acc += v * v;
                }
                *partial = acc;
            }
        }

        // pass 2: stage partials through scratch, then accumulate.
        // Uses the committed workspace when the negotiation phase provided
        // one; otherwise falls back to a transient device allocation.
        let (scratch_addr, transient) = if ws_addr != 0 && ws_bytes >= need {
            (ws_addr, false)
        } else {
            (heap.alloc(need)?, true)
        };
        let scratch = DevPtr::<T>::from_raw(scratch_addr);
        heap.slice_mut(scratch, blocks)?.copy_from_slice(&partials);
        let mut total = T::ZERO;
        for &p in heap.slice(scratch, blocks)? {
            total += p;
        }
        if transient {
            heap.free(scratch_addr);
        }
        total
    };

    let xnorm = sumsq.sqrt();
    if m == 0 || xnorm == T::ZERO {
        heap.slice_mut(t_ptr, 1)?[0] = T::ZERO;
        return Ok(());
    }

    let mag = (alpha0 * alpha0 + sumsq).sqrt();
    let beta = if alpha0 >= T::ZERO { -mag } else { mag };
    let tau = (beta - alpha0) / beta;
    let scale = T::ONE / (alpha0 - beta);

    let xs = heap.slice_mut(x_ptr, (m - 1) * inc + 1)?;
    for i in 0..m {
        xs[i * inc] *= scale;
    }
    heap.slice_mut(a_ptr, 1)?[0] = beta;
    heap.slice_mut(t_ptr, 1)?[0] = tau;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
