//! Test orchestration
//!
//! State machine over a single run. Setup short-circuits (invalid size,
//! pure memory query, degenerate quick return) each terminate the run
//! before any measurement; otherwise the evaluator and the profiler run in
//! that order, and results are handed to the reporter. Any status other
//! than the one expected at each step aborts the run; there is no retry
//! anywhere.

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::correctness::measure_error;
use super::perf::{measure_perf, TimingSample};
use super::workspace::query_workspace;
use super::{ReflectorData, RunConfig};
use crate::driver::DeviceContext;
use crate::element::Element;
use crate::error::Result;
use crate::kernels::{KernelStatus, ReflectorKernel};
use crate::reference::HostReflector;
use crate::report::{BenchNote, ReportSink, ReportValue};

/// Terminal state of one orchestrated run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// The kernel classified the requested size as invalid, as demanded
    Rejected,
    /// Pure memory query: required workspace bytes were reported
    SizeReported(usize),
    /// Degenerate size quick-returned success
    QuickReturn,
    /// Measurement ran to completion
    Completed {
        /// Error scalar, when a correctness phase ran
        max_error: Option<f64>,
        /// Timing sample, when the profiler ran
        timing: Option<TimingSample>,
    },
}

/// Drive one kernel through one configured run
///
/// # Errors
///
/// Any phase failure (unexpected status, allocation, transfer, execution,
/// or configuration) aborts the run with the offending error attached.
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(kernel = kernel.name(), n = cfg.n, incx = cfg.incx))
)]
pub fn run_reflector<T, K, R, S>(
    kernel: &K,
    oracle: &R,
    ctx: &DeviceContext,
    cfg: &RunConfig,
    sink: &mut S,
) -> Result<RunOutcome>
where
    T: Element,
    K: ReflectorKernel<T>,
    R: HostReflector<T>,
    S: ReportSink + ?Sized,
{
    cfg.validate()?;

    // invalid sizes must be rejected before the kernel touches any buffer
    if cfg.invalid_size() {
        kernel
            .launch(Some(ctx), cfg.n, None, None, cfg.incx, None)
            .require(KernelStatus::InvalidSize)?;
        if cfg.timing {
            sink.note(BenchNote::InvalidSize);
        }
        return Ok(RunOutcome::Rejected);
    }

    // workspace negotiation: requested explicitly, or mandatory when the
    // runtime cannot grow scratch memory on demand
    if cfg.mem_query || !ctx.realloc_on_demand() {
        let bytes = query_workspace(kernel, ctx, cfg.n, cfg.incx)?;
        if cfg.mem_query {
            sink.note(BenchNote::MemQuery(bytes));
            return Ok(RunOutcome::SizeReported(bytes));
        }
        ctx.set_workspace_size(bytes)?;
    }

    let mut data = ReflectorData::<T>::allocate(ctx, cfg)?;

    // degenerate size: the quick return must succeed on real buffers too
    if cfg.n == 0 {
        kernel
            .launch(
                Some(ctx),
                cfg.n,
                Some(&data.da),
                Some(&data.dx),
                cfg.incx,
                Some(&data.dt),
            )
            .require(KernelStatus::Success)?;
        if cfg.timing {
            sink.note(BenchNote::QuickReturn);
        }
        return Ok(RunOutcome::QuickReturn);
    }

    let max_error = if cfg.wants_correctness() {
        Some(measure_error(kernel, oracle, ctx, cfg, &mut data)?)
    } else {
        None
    };

    let timing = if cfg.timing {
        Some(measure_perf(kernel, oracle, ctx, cfg, &mut data)?)
    } else {
        None
    };

    if cfg.timing {
        report(cfg, max_error, timing.unwrap_or_default(), sink);
    }

    Ok(RunOutcome::Completed { max_error, timing })
}

/// Hand problem parameters, timings, and the error scalar to the reporter
fn report<S: ReportSink + ?Sized>(
    cfg: &RunConfig,
    max_error: Option<f64>,
    timing: TimingSample,
    sink: &mut S,
) {
    if cfg.perf_only {
        // terse single row for batched sweeps
        if cfg.norm_check {
            sink.output(&[
                ("gpu_time_us", ReportValue::F64(timing.gpu_time_us)),
                ("error", ReportValue::F64(max_error.unwrap_or(0.0))),
            ]);
        } else {
            sink.output(&[("gpu_time_us", ReportValue::F64(timing.gpu_time_us))]);
        }
        return;
    }

    sink.header("Arguments:");
    sink.output(&[
        ("n", ReportValue::Int(cfg.n)),
        ("inc", ReportValue::Int(cfg.incx)),
    ]);
    sink.header("Results:");
    if cfg.norm_check {
        sink.output(&[
            ("cpu_time_us", ReportValue::F64(timing.cpu_time_us)),
            ("gpu_time_us", ReportValue::F64(timing.gpu_time_us)),
            ("error", ReportValue::F64(max_error.unwrap_or(0.0))),
        ]);
    } else {
        sink.output(&[
            ("cpu_time_us", ReportValue::F64(timing.cpu_time_us)),
            ("gpu_time_us", ReportValue::F64(timing.gpu_time_us)),
        ]);
    }
}
