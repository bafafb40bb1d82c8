//! Performance profiling
//!
//! Cold/hot timing discipline: two untimed warm-up launches absorb
//! first-call setup costs, then `hot_calls` timed launches are averaged
//! into the GPU sample. Every launch, cold or hot, is preceded by a fresh
//! upload of the pristine generated inputs, so a kernel that mutates its
//! operands in place never sees its own previous output. Re-uploads cannot
//! drift because generation is seed-stable.
//!
//! Timestamps are taken relative to the device execution stream: the clock
//! is read only after the stream drains, so asynchronous dispatch never
//! leaks into the measurement.

#[cfg(feature = "tracing")]
use tracing::instrument;

use serde::Serialize;

use super::init::{init_reflector_data, InitPhase};
use super::{ReflectorData, RunConfig};
use crate::driver::{DeviceContext, ProfileLayer};
use crate::element::Element;
use crate::error::{HarnessError, Result};
use crate::kernels::ReflectorKernel;
use crate::reference::HostReflector;

/// Untimed warm-up launches before the measurement window
const COLD_CALLS: u32 = 2;

/// One timing measurement in microseconds
///
/// A zero-valued field means that measurement was skipped, not that it took
/// no time: the CPU sample stays zero in performance-only runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingSample {
    /// Single host-reference invocation
    pub cpu_time_us: f64,
    /// Device time averaged over the hot calls
    pub gpu_time_us: f64,
}

/// Measure steady-state kernel latency
///
/// # Errors
///
/// Returns [`HarnessError::Config`] for zero hot calls; any non-success
/// status from a cold or timed launch is fatal and discards all partial
/// timing data.
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(n = cfg.n, hot_calls = cfg.hot_calls))
)]
pub fn measure_perf<T, K, R>(
    kernel: &K,
    oracle: &R,
    ctx: &DeviceContext,
    cfg: &RunConfig,
    data: &mut ReflectorData<T>,
) -> Result<TimingSample>
where
    T: Element,
    K: ReflectorKernel<T>,
    R: HostReflector<T>,
{
    if cfg.hot_calls == 0 {
        return Err(HarnessError::Config(
            "cannot average over zero hot calls".to_string(),
        ));
    }

    let mut sample = TimingSample::default();

    // host baseline, skipped entirely in performance-only runs
    if !cfg.perf_only {
        init_reflector_data(InitPhase::HOST, cfg.seed, data)?;
        let start = ctx.time_us();
        let tau = oracle.generate(
            cfg.n,
            &mut data.ha.as_mut_slice()[0],
            data.hx.as_mut_slice(),
            cfg.incx,
        );
        sample.cpu_time_us = ctx.time_us() - start;
        data.ht.as_mut_slice()[0] = tau;
    }

    // restore pristine inputs after the reference ran in place
    init_reflector_data(InitPhase::HOST, cfg.seed, data)?;

    // cold calls
    for _ in 0..COLD_CALLS {
        init_reflector_data(InitPhase::DEVICE, cfg.seed, data)?;
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
    }

    // arm the profiling side channel just before the measurement window
    if cfg.profile.depth > 0 {
        ctx.set_profile_layer(ProfileLayer {
            max_levels: cfg.profile.depth,
            log_kernels: cfg.profile.profile_kernels,
        });
    }

    // hot calls
    let mut gpu_total = 0.0;
    for _ in 0..cfg.hot_calls {
        init_reflector_data(InitPhase::DEVICE, cfg.seed, data)?;
        let start = ctx.time_us_sync()?;
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
        gpu_total += ctx.time_us_sync()? - start;
    }
    sample.gpu_time_us = gpu_total / f64::from(cfg.hot_calls);

    Ok(sample)
}
