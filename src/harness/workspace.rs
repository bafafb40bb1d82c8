//! Workspace-size negotiation
//!
//! Asks the kernel how much scratch device memory it needs before any real
//! launch, via a query invocation with null data pointers. Querying is
//! idempotent for fixed parameters; any non-success answer is fatal.

use crate::driver::DeviceContext;
use crate::element::Element;
use crate::error::{HarnessError, Result};
use crate::kernels::{KernelStatus, ReflectorKernel};

/// Discover the scratch requirement for one problem shape
///
/// # Errors
///
/// Returns [`HarnessError::Workspace`] if the query launch answers with
/// anything but success.
pub fn query_workspace<T, K>(kernel: &K, ctx: &DeviceContext, n: i64, incx: i64) -> Result<usize>
where
    T: Element,
    K: ReflectorKernel<T>,
{
    ctx.begin_size_query();
    let status = kernel.launch(Some(ctx), n, None, None, incx, None);
    if status != KernelStatus::Success {
        // disarm so a later query starts clean
        let _ = ctx.end_size_query();
        return Err(HarnessError::Workspace(format!(
            "query launch returned {status:?}"
        )));
    }
    ctx.end_size_query()
}

/// Discover and commit the scratch requirement in one step
///
/// # Errors
///
/// Propagates query failures and [`HarnessError::Allocation`] if the
/// discovered size cannot be committed.
pub fn negotiate_workspace<T, K>(
    kernel: &K,
    ctx: &DeviceContext,
    n: i64,
    incx: i64,
) -> Result<usize>
where
    T: Element,
    K: ReflectorKernel<T>,
{
    let bytes = query_workspace(kernel, ctx, n, incx)?;
    ctx.set_workspace_size(bytes)?;
    Ok(bytes)
}
