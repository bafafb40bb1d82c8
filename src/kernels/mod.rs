//! Kernels Under Test
//!
//! The entry-point contract an accelerated kernel must satisfy to be driven
//! by the harness, plus the simulated reflector-generation kernel used as
//! the conforming implementation.
//!
//! ## Entry-point contract
//!
//! A launch classifies its arguments before doing anything else and answers
//! with a [`KernelStatus`]:
//!
//! 1. missing execution context → [`KernelStatus::InvalidHandle`]
//! 2. negative size or sub-unit stride → [`KernelStatus::InvalidSize`]
//! 3. armed memory-size query → record the scratch requirement, succeed
//!    without touching data
//! 4. degenerate size (zero) → quick-return [`KernelStatus::Success`]
//!    **before** any pointer validation
//! 5. missing data argument → [`KernelStatus::InvalidPointer`]
//!
//! Only after all five gates does the kernel queue device work.

mod larfg;

pub use larfg::SimLarfg;

use crate::driver::{DeviceBuffer, DeviceContext};
use crate::element::Element;
use crate::error::{HarnessError, Result};

/// Status classification returned by a kernel entry point
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelStatus {
    /// Arguments accepted; work queued (or quick-returned)
    Success,
    /// Execution-context handle missing
    InvalidHandle,
    /// Required data argument missing for a non-degenerate size
    InvalidPointer,
    /// Negative size or sub-unit stride
    InvalidSize,
}

impl KernelStatus {
    /// Demand an exact status, failing the run on anything else
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::StatusMismatch`] carrying both statuses.
    pub fn require(self, expected: KernelStatus) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(HarnessError::StatusMismatch {
                expected,
                actual: self,
            })
        }
    }

    /// Demand [`KernelStatus::Success`]
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::StatusMismatch`] on any other status.
    pub fn ok(self) -> Result<()> {
        self.require(KernelStatus::Success)
    }
}

/// Device entry point for the reflector-generation kernel family
///
/// Mirrors the scalar-plus-vector invocation shape: `alpha` holds the
/// leading scalar, `x` the remaining `n - 1` elements with stride `incx`,
/// and `tau` receives the reflector coefficient. Optional arguments model
/// nullable device pointers so defensive argument checking can be exercised.
pub trait ReflectorKernel<T: Element> {
    /// Kernel name for reporting
    fn name(&self) -> &str;

    /// Launch the kernel, classifying arguments per the entry-point contract
    fn launch(
        &self,
        ctx: Option<&DeviceContext>,
        n: i64,
        alpha: Option<&DeviceBuffer<T>>,
        x: Option<&DeviceBuffer<T>>,
        incx: i64,
        tau: Option<&DeviceBuffer<T>>,
    ) -> KernelStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_matching_status() {
        assert!(KernelStatus::InvalidSize
            .require(KernelStatus::InvalidSize)
            .is_ok());
    }

    #[test]
    fn test_require_mismatch_carries_both() {
        let err = KernelStatus::InvalidPointer
            .require(KernelStatus::Success)
            .unwrap_err();
        assert_eq!(
            err,
            HarnessError::StatusMismatch {
                expected: KernelStatus::Success,
                actual: KernelStatus::InvalidPointer,
            }
        );
    }

    #[test]
    fn test_ok_shorthand() {
        assert!(KernelStatus::Success.ok().is_ok());
        assert!(KernelStatus::InvalidHandle.ok().is_err());
    }
}
