//! Defensive argument checking
//!
//! Drives the kernel with deliberately malformed arguments and demands the
//! exact documented classification for each. No numeric comparison happens
//! here; the dummy buffers are fixed at one element regardless of the
//! nominal problem size.

use crate::driver::{DeviceBuffer, DeviceContext};
use crate::element::Element;
use crate::error::Result;
use crate::kernels::{KernelStatus, ReflectorKernel};

/// Safe nominal size used while nulling individual arguments
const SAFE_N: i64 = 2;
/// Safe stride used throughout
const SAFE_INC: i64 = 1;

/// Assert the kernel's error-signaling surface
///
/// Checks, in order: null handle, each data argument individually nulled
/// with the rest valid, and the degenerate-size quick return with all data
/// null (which must succeed *without* reaching pointer validation).
///
/// # Errors
///
/// Returns [`crate::HarnessError::StatusMismatch`] on the first
/// classification that differs from the documented one.
pub fn check_bad_args<T, K>(kernel: &K, ctx: &DeviceContext) -> Result<()>
where
    T: Element,
    K: ReflectorKernel<T>,
{
    let da = DeviceBuffer::<T>::new(ctx, 1, 1)?;
    let dx = DeviceBuffer::<T>::new(ctx, 1, 1)?;
    let dt = DeviceBuffer::<T>::new(ctx, 1, 1)?;

    // handle
    kernel
        .launch(None, SAFE_N, Some(&da), Some(&dx), SAFE_INC, Some(&dt))
        .require(KernelStatus::InvalidHandle)?;

    // pointers, one at a time
    kernel
        .launch(Some(ctx), SAFE_N, None, Some(&dx), SAFE_INC, Some(&dt))
        .require(KernelStatus::InvalidPointer)?;
    kernel
        .launch(Some(ctx), SAFE_N, Some(&da), None, SAFE_INC, Some(&dt))
        .require(KernelStatus::InvalidPointer)?;
    kernel
        .launch(Some(ctx), SAFE_N, Some(&da), Some(&dx), SAFE_INC, None)
        .require(KernelStatus::InvalidPointer)?;

    // quick return with invalid pointers
    kernel
        .launch(Some(ctx), 0, None, None, SAFE_INC, None)
        .require(KernelStatus::Success)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::SimLarfg;

    #[test]
    fn test_conforming_kernel_passes() {
        let ctx = DeviceContext::new();
        assert!(check_bad_args::<f32, _>(&SimLarfg::new(), &ctx).is_ok());
        assert!(check_bad_args::<f64, _>(&SimLarfg::new(), &ctx).is_ok());
    }

    #[test]
    fn test_nonconforming_kernel_is_caught() {
        /// Kernel that crashes-by-accepting: never validates anything
        struct Accepting;

        impl<T: Element> ReflectorKernel<T> for Accepting {
            fn name(&self) -> &str {
                "accepting"
            }

            fn launch(
                &self,
                _ctx: Option<&DeviceContext>,
                _n: i64,
                _alpha: Option<&DeviceBuffer<T>>,
                _x: Option<&DeviceBuffer<T>>,
                _incx: i64,
                _tau: Option<&DeviceBuffer<T>>,
            ) -> KernelStatus {
                KernelStatus::Success
            }
        }

        let ctx = DeviceContext::new();
        let err = check_bad_args::<f64, _>(&Accepting, &ctx).unwrap_err();
        assert_eq!(
            err,
            crate::HarnessError::StatusMismatch {
                expected: KernelStatus::InvalidHandle,
                actual: KernelStatus::Success,
            }
        );
    }
}
