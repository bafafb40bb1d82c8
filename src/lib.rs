//! # comprobar: Kernel Verification and Benchmarking Harness
//!
//! Drive an accelerated numerical kernel through defensive argument checks,
//! reproducible correctness evaluation against a trusted host reference,
//! and a cold/hot timing discipline: one protocol, one kernel invocation
//! shape per instantiation.
//!
//! ## Philosophy
//!
//! **Trust nothing, measure everything**: the kernel's error signaling is
//! asserted exactly, its numerics are reduced to one scalar against the
//! host oracle, and its latency is measured only across synchronized
//! stream boundaries with warm-up costs amortized outside the window.
//!
//! ## Quick Start
//!
//! ```rust
//! use comprobar::driver::DeviceContext;
//! use comprobar::harness::{run_reflector, RunConfig, RunOutcome};
//! use comprobar::kernels::SimLarfg;
//! use comprobar::norm::within_tolerance;
//! use comprobar::reference::NativeReflector;
//! use comprobar::report::TextReporter;
//!
//! let ctx = DeviceContext::new();
//! let cfg = RunConfig::new(50, 2).with_checks(true, true);
//! let mut sink = TextReporter::new();
//!
//! let outcome =
//!     run_reflector::<f64, _, _, _>(&SimLarfg::new(), &NativeReflector, &ctx, &cfg, &mut sink)
//!         .expect("run failed");
//!
//! let RunOutcome::Completed { max_error: Some(err), .. } = outcome else {
//!     panic!("expected a completed run");
//! };
//! assert!(within_tolerance::<f64>(err, cfg.n));
//! ```
//!
//! ## Modules
//!
//! - [`harness`] - the verification protocol (config, phases, orchestrator)
//! - [`driver`] - simulated device runtime (context, buffers, stream)
//! - [`kernels`] - kernel-under-test contract and the reflector kernel
//! - [`reference`] - trusted host oracles
//! - [`norm`] - error-norm reduction and tolerance policy
//! - [`report`] - result sinks

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
// Allow uninlined format args - stylistic preference
#![allow(clippy::uninlined_format_args)]
// Allow cast_precision_loss - problem sizes fit f64 mantissas
#![allow(clippy::cast_precision_loss)]
// Allow cast_sign_loss - sizes are validated non-negative before casts
#![allow(clippy::cast_sign_loss)]
// Allow unwrap_used in tests
#![allow(clippy::unwrap_used)]

pub mod driver;
pub mod element;
pub mod harness;
pub mod kernels;
pub mod norm;
pub mod reference;
pub mod report;

/// Error types for harness operations
pub mod error;

pub use element::Element;
pub use error::{HarnessError, Result};
pub use harness::{run_reflector, RunConfig, RunOutcome, TimingSample};
pub use kernels::{KernelStatus, ReflectorKernel};
