//! Correctness evaluation
//!
//! Runs the device kernel and the host reference on matching inputs and
//! reduces their disagreement to one error scalar. No pass/fail judgement
//! happens here; thresholding against the scaled bound is the caller's
//! concern.
//!
//! The compared region is the logical vector only (`n - 1` elements): the
//! leading scalar is a convention-fixed output, not part of the vector, and
//! the reflector coefficient is deliberately left out of the comparison.

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::init::{init_reflector_data, InitPhase};
use super::{ReflectorData, RunConfig};
use crate::driver::DeviceContext;
use crate::element::Element;
use crate::error::Result;
use crate::kernels::ReflectorKernel;
use crate::norm::{norm_error, NormKind};
use crate::reference::HostReflector;

/// Produce the error scalar for one generated input set
///
/// Steps: initialize (generate + upload), launch the device kernel (any
/// non-success status is fatal), transfer the device vector back, run the
/// host reference on the retained host input, and reduce with the one-norm
/// over the valid sub-region. An empty compared region yields `0.0`.
///
/// # Errors
///
/// Propagates status mismatches, transfer failures, and execution failures;
/// all abort the run.
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(n = cfg.n, incx = cfg.incx))
)]
pub fn measure_error<T, K, R>(
    kernel: &K,
    oracle: &R,
    ctx: &DeviceContext,
    cfg: &RunConfig,
    data: &mut ReflectorData<T>,
) -> Result<f64>
where
    T: Element,
    K: ReflectorKernel<T>,
    R: HostReflector<T>,
{
    // one generated-and-transferred input set
    init_reflector_data(InitPhase::BOTH, cfg.seed, data)?;

    // device path
    kernel
        .launch(
            Some(ctx),
            cfg.n,
            Some(&data.da),
            Some(&data.dx),
            cfg.incx,
            Some(&data.dt),
        )
        .ok()?;
    data.dx.copy_to_host(&mut data.hxr)?;

    // host path, in place on the retained input
    let tau = oracle.generate(
        cfg.n,
        &mut data.ha.as_mut_slice()[0],
        data.hx.as_mut_slice(),
        cfg.incx,
    );
    data.ht.as_mut_slice()[0] = tau;

    let compared = if cfg.n > 1 { (cfg.n - 1) as usize } else { 0 };
    Ok(norm_error(
        NormKind::One,
        compared,
        cfg.incx as usize,
        data.hx.as_slice(),
        data.hxr.as_slice(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::SimLarfg;
    use crate::norm::within_tolerance;
    use crate::reference::NativeReflector;

    fn run_once(n: i64, incx: i64, seed: u64) -> f64 {
        let ctx = DeviceContext::new();
        let cfg = RunConfig::new(n, incx).with_checks(true, true).with_seed(seed);
        let mut data = ReflectorData::<f64>::allocate(&ctx, &cfg).unwrap();
        measure_error(&SimLarfg::new(), &NativeReflector, &ctx, &cfg, &mut data).unwrap()
    }

    #[test]
    fn test_error_within_scaled_bound() {
        for n in [2i64, 17, 64, 300] {
            let err = run_once(n, 1, 11);
            assert!(
                within_tolerance::<f64>(err, n),
                "n={n}: error {err} above bound"
            );
        }
    }

    #[test]
    fn test_strided_error_within_bound() {
        let err = run_once(50, 2, 5);
        assert!(within_tolerance::<f64>(err, 50));
    }

    #[test]
    fn test_error_scalar_is_deterministic() {
        assert_eq!(run_once(64, 1, 123), run_once(64, 1, 123));
    }

    #[test]
    fn test_single_element_problem_trivially_agrees() {
        assert_eq!(run_once(1, 1, 2), 0.0);
    }

    #[test]
    fn test_f32_error_within_f32_bound() {
        let ctx = DeviceContext::new();
        let cfg = RunConfig::new(128, 1).with_checks(true, false);
        let mut data = ReflectorData::<f32>::allocate(&ctx, &cfg).unwrap();
        let err =
            measure_error(&SimLarfg::new(), &NativeReflector, &ctx, &cfg, &mut data).unwrap();
        assert!(within_tolerance::<f32>(err, 128));
        // and the f32 bound is meaningfully looser than the f64 one
        assert!(crate::norm::error_bound::<f32>(128) > crate::norm::error_bound::<f64>(128));
    }
}
