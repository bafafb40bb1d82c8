//! Verification-and-benchmarking protocol
//!
//! The phases that drive one kernel through one run:
//!
//! 1. [`validate::check_bad_args`] - defensive argument checking against the
//!    documented status classifications
//! 2. [`workspace::query_workspace`] - scratch-size negotiation before any
//!    real launch
//! 3. [`init::init_reflector_data`] - reproducible input generation and
//!    device upload
//! 4. [`correctness::measure_error`] - device vs. host-reference comparison
//!    reduced to one error scalar
//! 5. [`perf::measure_perf`] - cold/hot timing discipline with
//!    stream-synchronized timestamps
//! 6. [`orchestrator::run_reflector`] - the state machine sequencing all of
//!    the above per the run configuration
//!
//! Each phase fully completes, including device synchronization, before the
//! next begins. Any status other than the one a phase expects is fatal to
//! the run; nothing is retried.

pub mod config;
pub mod correctness;
pub mod init;
pub mod orchestrator;
pub mod perf;
pub mod validate;
pub mod workspace;

pub use config::{ProfileConfig, RunConfig, DEFAULT_HOT_CALLS, DEFAULT_SEED};
pub use correctness::measure_error;
pub use init::{init_reflector_data, InitPhase};
pub use orchestrator::{run_reflector, RunOutcome};
pub use perf::{measure_perf, TimingSample};
pub use validate::check_bad_args;
pub use workspace::{negotiate_workspace, query_workspace};

use crate::driver::{DeviceBuffer, DeviceContext, HostBuffer};
use crate::element::Element;
use crate::error::Result;

/// Buffer set for one reflector-kernel run
///
/// Host and device buffers of the same logical shape are paired; the set is
/// owned by one orchestrator invocation and dropped with it. When the
/// problem size is degenerate the vector buffers keep a minimum footprint of
/// one element so no launch ever sees a dereferenceable-but-empty
/// allocation; the result buffer `hxr` is only materialized when a
/// correctness phase will transfer into it.
pub struct ReflectorData<T> {
    /// Host leading scalar (alpha in, beta out)
    pub ha: HostBuffer<T>,
    /// Host vector input, overwritten by the reference
    pub hx: HostBuffer<T>,
    /// Host destination for the device result
    pub hxr: HostBuffer<T>,
    /// Host reflector coefficient
    pub ht: HostBuffer<T>,
    /// Device leading scalar
    pub da: DeviceBuffer<T>,
    /// Device vector
    pub dx: DeviceBuffer<T>,
    /// Device reflector coefficient
    pub dt: DeviceBuffer<T>,
}

impl<T: Element> ReflectorData<T> {
    /// Allocate the buffer set for a validated, non-negative problem size
    ///
    /// # Errors
    ///
    /// Returns [`crate::HarnessError::Allocation`] if the device heap
    /// cannot hold the set.
    pub fn allocate(ctx: &DeviceContext, cfg: &RunConfig) -> Result<Self> {
        let size_x = if cfg.n > 1 { (cfg.n - 1) as usize } else { 1 };
        let inc = cfg.incx.max(1) as usize;
        let size_xr = if cfg.wants_correctness() { size_x } else { 0 };

        Ok(Self {
            ha: HostBuffer::new(1, 1),
            hx: HostBuffer::new(size_x, inc),
            hxr: HostBuffer::new(size_xr, inc),
            ht: HostBuffer::new(1, 1),
            da: DeviceBuffer::new(ctx, 1, 1)?,
            dx: DeviceBuffer::new(ctx, size_x, inc)?,
            dt: DeviceBuffer::new(ctx, 1, 1)?,
        })
    }
}
