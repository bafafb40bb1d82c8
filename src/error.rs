//! Error types for harness operations
//!
//! Every error here is fatal to the current run: nothing is retried or
//! recovered locally. The only "expected errors" are the statuses the
//! argument validator provokes deliberately, and those surface as
//! [`HarnessError::StatusMismatch`] when the kernel answers with anything
//! other than the documented classification.

use thiserror::Error;

use crate::kernels::KernelStatus;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while driving a kernel under test
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Kernel answered with a status other than the one the protocol expects
    #[error("kernel returned {actual:?}, expected {expected:?}")]
    StatusMismatch {
        /// Status the current phase requires
        expected: KernelStatus,
        /// Status the kernel actually returned
        actual: KernelStatus,
    },

    /// Device memory allocation failed
    #[error("device allocation failed: {0}")]
    Allocation(String),

    /// Host/device transfer failed
    #[error("device transfer failed: {0}")]
    Transfer(String),

    /// Queued device work failed at a synchronization point
    #[error("kernel execution failed: {0}")]
    Execution(String),

    /// Workspace size negotiation failed
    #[error("workspace query failed: {0}")]
    Workspace(String),

    /// Run configuration rejected before any allocation
    #[error("invalid run configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mismatch_display() {
        let err = HarnessError::StatusMismatch {
            expected: KernelStatus::Success,
            actual: KernelStatus::InvalidPointer,
        };
        assert!(err.to_string().contains("InvalidPointer"));
        assert!(err.to_string().contains("expected Success"));
    }

    #[test]
    fn test_transfer_display() {
        let err = HarnessError::Transfer("length mismatch".to_string());
        assert!(err.to_string().contains("transfer failed"));
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn test_error_equality() {
        let a = HarnessError::Allocation("heap exhausted".to_string());
        let b = a.clone();
        assert_eq!(a, b);
    }
}
