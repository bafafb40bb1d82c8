//! Property tests over the protocol contract

use proptest::prelude::*;

use comprobar::driver::{DeviceBuffer, DeviceContext};
use comprobar::harness::{query_workspace, run_reflector, RunConfig, RunOutcome};
use comprobar::kernels::{KernelStatus, ReflectorKernel, SimLarfg};
use comprobar::norm::within_tolerance;
use comprobar::reference::NativeReflector;
use comprobar::report::RecordingReporter;

proptest! {
    /// Correctly allocated buffers with valid sizes never provoke a
    /// size or pointer classification.
    #[test]
    fn valid_shapes_always_accepted(n in 0i64..300, incx in 1i64..4) {
        let ctx = DeviceContext::new();
        let kernel = SimLarfg::new();
        let size_x = if n > 1 { (n - 1) as usize } else { 1 };
        let da = DeviceBuffer::<f64>::new(&ctx, 1, 1).unwrap();
        let dx = DeviceBuffer::<f64>::new(&ctx, size_x, incx as usize).unwrap();
        let dt = DeviceBuffer::<f64>::new(&ctx, 1, 1).unwrap();

        let status = kernel.launch(Some(&ctx), n, Some(&da), Some(&dx), incx, Some(&dt));
        prop_assert_eq!(status, KernelStatus::Success);
        ctx.synchronize().unwrap();
    }

    /// Negative sizes are classified before any buffer is touched; null
    /// data pointers must not matter.
    #[test]
    fn negative_size_always_rejected(n in -100i64..0, incx in 1i64..4) {
        let ctx = DeviceContext::new();
        let kernel = SimLarfg::new();
        let status = <SimLarfg as ReflectorKernel<f64>>::launch(
            &kernel, Some(&ctx), n, None, None, incx, None,
        );
        prop_assert_eq!(status, KernelStatus::InvalidSize);
        prop_assert_eq!(ctx.pending_ops(), 0);
    }

    /// Sub-unit strides are rejected even for otherwise valid sizes.
    #[test]
    fn sub_unit_stride_always_rejected(n in 0i64..100, incx in -3i64..1) {
        let ctx = DeviceContext::new();
        let kernel = SimLarfg::new();
        let status = <SimLarfg as ReflectorKernel<f64>>::launch(
            &kernel, Some(&ctx), n, None, None, incx, None,
        );
        prop_assert_eq!(status, KernelStatus::InvalidSize);
        prop_assert_eq!(ctx.pending_ops(), 0);
    }

    /// The degenerate size succeeds with all-null data for any stride.
    #[test]
    fn quick_return_for_any_valid_stride(incx in 1i64..10) {
        let ctx = DeviceContext::new();
        let kernel = SimLarfg::new();
        let status = <SimLarfg as ReflectorKernel<f32>>::launch(
            &kernel, Some(&ctx), 0, None, None, incx, None,
        );
        prop_assert_eq!(status, KernelStatus::Success);
    }

    /// Querying the workspace twice with identical parameters reports the
    /// same byte count.
    #[test]
    fn workspace_query_idempotent(n in 0i64..5000, incx in 1i64..4) {
        let ctx = DeviceContext::new();
        let kernel = SimLarfg::new();
        let first = query_workspace::<f64, _>(&kernel, &ctx, n, incx).unwrap();
        let second = query_workspace::<f64, _>(&kernel, &ctx, n, incx).unwrap();
        prop_assert_eq!(first, second);
    }

    /// The comparison pipeline is deterministic per seed and the error
    /// scalar stays below the scaled bound.
    #[test]
    fn error_scalar_bounded_and_deterministic(n in 2i64..200, seed in 0u64..1000) {
        let cfg = RunConfig::new(n, 1).with_checks(true, false).with_seed(seed);
        let ctx = DeviceContext::new();
        let mut sink = RecordingReporter::new();
        let kernel = SimLarfg::new();

        let first = run_reflector::<f64, _, _, _>(&kernel, &NativeReflector, &ctx, &cfg, &mut sink)
            .unwrap();
        let second = run_reflector::<f64, _, _, _>(&kernel, &NativeReflector, &ctx, &cfg, &mut sink)
            .unwrap();
        let (
            RunOutcome::Completed { max_error: Some(a), .. },
            RunOutcome::Completed { max_error: Some(b), .. },
        ) = (first, second) else {
            return Err(TestCaseError::fail("expected completed runs"));
        };
        prop_assert_eq!(a, b);
        prop_assert!(within_tolerance::<f64>(a, n));
    }
}
